//! Error types for the financial query agent

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Daemon Lifecycle Errors
    // =============================

    #[error("Connection to Ollama timed out after {0:?}")]
    ConnectionTimeout(std::time::Duration),

    #[error("Failed to connect to Ollama after {attempts} attempts")]
    DaemonStartupTimeout { attempts: u32 },

    #[error("Ollama daemon crashed: {0}")]
    DaemonCrashed(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    // =============================
    // Inference Errors
    // =============================

    #[error("No model selected: {0}")]
    NoModelSelected(String),

    #[error("Empty response from Ollama: {0}")]
    EmptyResponse(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    // =============================
    // Service Errors
    // =============================

    #[error("Account error: {0}")]
    AccountError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
