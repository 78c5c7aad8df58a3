//! REST API Server for the financial query agent
//!
//! Exposes the query router via HTTP endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn, Instrument};

use crate::accounts::AccountProvider;
use crate::inference::InferenceClient;
use crate::models::{ConnectionState, QueryResult};
use crate::router::QueryRouter;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub router: Arc<QueryRouter>,
    pub accounts: Arc<dyn AccountProvider>,
    /// Only consulted by the health endpoint
    pub inference: Option<Arc<InferenceClient>>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    // Without a client there is no daemon to depend on
    let (status, daemon, model) = match &state.inference {
        Some(client) => match client.state().await {
            ConnectionState::Ready(model) => ("healthy", "ready".to_string(), Some(model.to_string())),
            other => ("degraded", other.to_string(), None),
        },
        None => ("healthy", "unmanaged".to_string(), None),
    };

    Json(serde_json::json!({
        "status": status,
        "ollama": daemon,
        "model": model,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn run_query(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> (StatusCode, Json<QueryResponse>) {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("query", %request_id);

    async move {
        let req = match payload {
            Ok(Json(req)) => req,
            Err(rejection) => {
                warn!(error = %rejection, "Rejected query body");
                let apology = QueryResult::apology();
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(QueryResponse { response: apology.text }),
                );
            }
        };

        info!("Received query: {}", req.query);

        let result = match state.accounts.snapshot().await {
            Ok(snapshot) => state.router.handle(&req.query, &snapshot).await,
            Err(e) => {
                error!(error = %e, "Failed to load financial data");
                QueryResult::apology()
            }
        };

        let status = if result.failed {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };

        (status, Json(QueryResponse { response: result.text }))
    }
    .instrument(span)
    .await
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(run_query))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server<F>(
    state: ApiState,
    port: u16,
    shutdown: F,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("Financial AI agent running on port {}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, SIGTERM or SIGUSR2 (nodemon-style restarts)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::user_defined2())) {
            (Ok(mut term), Ok(mut usr2)) => {
                tokio::select! {
                    _ = term.recv() => {},
                    _ = usr2.recv() => {},
                }
            }
            _ => {
                warn!("Failed to install Unix signal handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
}
