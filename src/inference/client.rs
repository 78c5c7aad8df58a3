//! Ollama client
//!
//! Verifies the daemon, negotiates a model and issues non-streaming
//! generation calls. Uses a long-lived reqwest::Client for connection pooling.

use crate::config::InferenceConfig;
use crate::error::AgentError;
use crate::inference::prompt::{build_analysis_prompt, clean_response};
use crate::models::{ConnectionState, FinancialSnapshot, ModelDescriptor, ModelName};
use crate::retry::{Attempt, RetryError, RetryPolicy};
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Reusable Ollama client (connection-pooled)
pub struct InferenceClient {
    client: Client,
    config: InferenceConfig,
    state: RwLock<ConnectionState>,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            config,
            state: RwLock::new(ConnectionState::Uninitialized),
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    pub async fn selected_model(&self) -> Option<ModelName> {
        self.state.read().await.model().cloned()
    }

    /// List models and select one. Never fails: timeouts, transport errors
    /// and an empty selection all come back as `false`.
    pub async fn verify_connection(&self) -> bool {
        *self.state.write().await = ConnectionState::Verifying;

        let listed = match tokio::time::timeout(self.config.verify_timeout, self.list_models()).await {
            Ok(result) => result,
            // Dropping the future aborts the in-flight request
            Err(_) => Err(AgentError::ConnectionTimeout(self.config.verify_timeout)),
        };

        let next = match listed {
            Ok(models) => self.select_from(&models),
            Err(AgentError::ConnectionTimeout(limit)) => {
                error!(timeout = ?limit, "Connection timeout while trying to reach Ollama");
                ConnectionState::Unreachable
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to Ollama");
                ConnectionState::Unreachable
            }
        };

        let ready = matches!(next, ConnectionState::Ready(_));
        *self.state.write().await = next;
        ready
    }

    fn select_from(&self, models: &[ModelDescriptor]) -> ConnectionState {
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        info!(count = models.len(), models = ?names, "Available models");

        match self
            .config
            .preferences
            .select(models)
            .and_then(|m| ModelName::new(m.name.clone()))
        {
            Some(model) => {
                info!(model = %model, "Selected model");
                ConnectionState::Ready(model)
            }
            None => {
                error!(
                    preferences = ?self.config.preferences.names,
                    "No suitable model found. {}",
                    self.config.preferences.install_hint()
                );
                ConnectionState::Unreachable
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let url = format!("{}/api/tags", self.config.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AgentError::InferenceError(format!(
                "HTTP error! status: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models)
    }

    /// Poll `verify_connection` until a model is ready or the policy runs out
    pub async fn wait_until_ready(&self, policy: &RetryPolicy) -> Result<ModelName> {
        policy
            .run(|attempt| async move {
                if self.verify_connection().await {
                    if let Some(model) = self.selected_model().await {
                        return Attempt::Ready(model);
                    }
                }
                info!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    "Waiting for Ollama to be ready..."
                );
                Attempt::<ModelName, AgentError>::Pending
            })
            .await
            .map_err(|e| match e {
                RetryError::Exhausted { attempts } => AgentError::DaemonStartupTimeout { attempts },
                RetryError::Aborted(e) => e,
            })
    }

    /// Analyze `query` against `snapshot` with the selected model
    pub async fn generate(&self, query: &str, snapshot: &FinancialSnapshot) -> Result<String> {
        let model = match self.selected_model().await {
            Some(model) => model,
            None => {
                debug!("No model selected yet, verifying connection");
                self.verify_connection().await;
                self.selected_model().await.ok_or_else(|| {
                    AgentError::NoModelSelected(self.config.preferences.install_hint())
                })?
            }
        };

        let request = GenerateRequest {
            model: model.as_str(),
            prompt: build_analysis_prompt(query, snapshot)?,
            stream: false,
            options: GenerationOptions::default(),
        };

        let url = format!("{}/api/generate", self.config.base_url);

        info!(model = %model, "Calling Ollama generate");

        let response = self
            .client
            .post(&url)
            .timeout(self.config.generate_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Ollama generate request failed: {}", e);
                AgentError::InferenceError(format!("Failed to get AI response: {}", e))
            })?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            error!(%status, body = %raw, "Ollama API error response");
            return Err(AgentError::InferenceError(format!(
                "HTTP error! status: {}",
                status
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&raw).map_err(|e| {
            error!(body = %raw, "Unexpected Ollama response: {}", e);
            AgentError::InferenceError(format!("Invalid response from Ollama: {}", e))
        })?;

        let text = match parsed.response {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                warn!(body = %raw, "Ollama returned no text");
                return Err(AgentError::EmptyResponse(raw));
            }
        };

        Ok(clean_response(&text))
    }
}

#[async_trait::async_trait]
impl super::ConnectionProbe for InferenceClient {
    async fn verify_connection(&self) -> bool {
        InferenceClient::verify_connection(self).await
    }
}

#[async_trait::async_trait]
impl super::Generator for InferenceClient {
    async fn generate(&self, query: &str, snapshot: &FinancialSnapshot) -> Result<String> {
        InferenceClient::generate(self, query, snapshot).await
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerationOptions {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    num_predict: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            num_predict: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}
