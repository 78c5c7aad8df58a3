//! Environment-driven configuration
//!
//! Every knob has a default so the service runs with an empty environment.
//! Binaries call `dotenv::dotenv()` before `AgentConfig::from_env()`.

use crate::error::AgentError;
use crate::inference::{MatchPolicy, ModelPreferences};
use crate::retry::RetryPolicy;
use crate::Result;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub preferences: ModelPreferences,
    pub verify_timeout: Duration,
    pub generate_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_HOST.to_string(),
            preferences: ModelPreferences::default(),
            verify_timeout: Duration::from_secs(10),
            generate_timeout: Duration::from_secs(300),
        }
    }
}

impl InferenceConfig {
    /// Port of the daemon's listener, used by the port-release commands
    pub fn daemon_port(&self) -> u16 {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.port_or_known_default())
            .unwrap_or(11434)
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub poll: RetryPolicy,
    pub shutdown_grace: Duration,
    /// Overrides the platform's default daemon executable
    pub executable: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll: RetryPolicy::new(Duration::from_secs(3), 15),
            shutdown_grace: Duration::from_secs(1),
            executable: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub port: u16,
    /// When false the daemon is never restarted; startup only waits for it
    pub supervise: bool,
    pub inference: InferenceConfig,
    pub supervisor: SupervisorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            supervise: true,
            inference: InferenceConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = parse_var(&lookup, "PORT")? {
            cfg.port = port;
        }

        if let Some(flag) = lookup("OLLAMA_SUPERVISE") {
            cfg.supervise = parse_flag("OLLAMA_SUPERVISE", &flag)?;
        }

        if let Some(host) = lookup("OLLAMA_HOST") {
            cfg.inference.base_url = host.trim_end_matches('/').to_string();
        }

        if let Some(models) = lookup("OLLAMA_MODELS") {
            let names: Vec<String> = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if names.is_empty() {
                return Err(AgentError::ConfigError(
                    "OLLAMA_MODELS must name at least one model".to_string(),
                ));
            }
            cfg.inference.preferences.names = names;
        }

        if let Some(policy) = lookup("OLLAMA_MODEL_MATCH") {
            cfg.inference.preferences.policy = policy.parse::<MatchPolicy>()?;
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "OLLAMA_VERIFY_TIMEOUT_SECS")? {
            cfg.inference.verify_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "OLLAMA_GENERATE_TIMEOUT_SECS")? {
            cfg.inference.generate_timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = parse_var(&lookup, "OLLAMA_STARTUP_RETRIES")? {
            cfg.supervisor.poll.max_attempts = retries;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "OLLAMA_STARTUP_RETRY_DELAY_MS")? {
            cfg.supervisor.poll.interval = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "OLLAMA_SHUTDOWN_GRACE_MS")? {
            cfg.supervisor.shutdown_grace = Duration::from_millis(ms);
        }

        if let Some(bin) = lookup("OLLAMA_BIN").filter(|b| !b.trim().is_empty()) {
            cfg.supervisor.executable = Some(bin);
        }

        Ok(cfg)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AgentError::ConfigError(format!("{}={:?}: {}", key, raw, e))),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AgentError::ConfigError(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}
