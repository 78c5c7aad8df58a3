//! Model negotiation
//!
//! The preference list and the matching policy are both configuration:
//! `Substring` matches `llama3` against `llama3:latest`, `Exact` requires
//! the full tag.

use crate::error::AgentError;
use crate::models::ModelDescriptor;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Case-insensitive `contains`
    #[default]
    Substring,
    /// Full name (or model tag) equality
    Exact,
}

impl FromStr for MatchPolicy {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" | "contains" => Ok(MatchPolicy::Substring),
            "exact" => Ok(MatchPolicy::Exact),
            other => Err(AgentError::ConfigError(format!(
                "unknown model match policy {:?} (expected 'substring' or 'exact')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPreferences {
    /// Highest priority first
    pub names: Vec<String>,
    pub policy: MatchPolicy,
}

impl Default for ModelPreferences {
    fn default() -> Self {
        Self {
            names: vec!["llama3".to_string()],
            policy: MatchPolicy::Substring,
        }
    }
}

impl ModelPreferences {
    /// First available model matching the highest-ranked preference
    pub fn select<'a>(&self, available: &'a [ModelDescriptor]) -> Option<&'a ModelDescriptor> {
        self.names.iter().find_map(|preferred| {
            available
                .iter()
                .find(|model| self.matches(preferred, model))
        })
    }

    fn matches(&self, preferred: &str, model: &ModelDescriptor) -> bool {
        match self.policy {
            MatchPolicy::Substring => model
                .name
                .to_lowercase()
                .contains(&preferred.to_lowercase()),
            MatchPolicy::Exact => {
                model.name == preferred || model.model.as_deref() == Some(preferred)
            }
        }
    }

    /// Operator hint for when nothing matched
    pub fn install_hint(&self) -> String {
        let first = self.names.first().map(String::as_str).unwrap_or("llama3");
        format!("Please pull a model using 'ollama pull {}'", first)
    }
}
