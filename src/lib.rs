//! Financial Query Agent
//!
//! A small service that answers questions about account transactions:
//! - Canned queries (subscriptions, monthly summary) are answered locally
//! - Everything else is analyzed by a local Ollama model
//! - The Ollama daemon is verified, and restarted if needed, at startup
//!
//! STARTUP:
//! CONFIG → PROBE → (RESTART → POLL)? → SERVE → SHUTDOWN

pub mod accounts;
pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod retry;
pub mod router;
pub mod supervisor;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use config::AgentConfig;
pub use inference::InferenceClient;
pub use router::{QueryRoute, QueryRouter};
pub use supervisor::{DaemonHandle, ProcessSupervisor};
