//! Inference daemon integration
//!
//! `ConnectionProbe` is what the supervisor polls while the daemon starts;
//! `Generator` is what the router delegates free-form questions to. Both are
//! implemented by `InferenceClient` and can be swapped out in tests.

use crate::models::FinancialSnapshot;
use crate::Result;
use async_trait::async_trait;

pub mod client;
pub mod prompt;
pub mod selection;

pub use client::InferenceClient;
pub use selection::{MatchPolicy, ModelPreferences};

/// Reachability check used during startup polling
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn verify_connection(&self) -> bool;
}

/// Free-form analysis backend
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, query: &str, snapshot: &FinancialSnapshot) -> Result<String>;
}
