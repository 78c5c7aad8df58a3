use financial_query_agent::{
    accounts::InMemoryAccountService,
    api::{shutdown_signal, start_server, ApiState},
    config::AgentConfig,
    inference::InferenceClient,
    router::QueryRouter,
    supervisor::{PlatformProfile, ProcessSupervisor},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AgentConfig::from_env()?;

    info!("🚀 Financial Query Agent - API Server");
    info!("📍 Port: {}", config.port);
    info!("🦙 Ollama: {}", config.inference.base_url);

    // Create components
    let client = Arc::new(InferenceClient::new(config.inference.clone())?);
    let supervisor = ProcessSupervisor::new(
        PlatformProfile::current(config.inference.daemon_port()),
        client.clone(),
        &config.supervisor,
    );

    let daemon = if config.supervise {
        match supervisor.ensure_running().await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to start server: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        if let Err(e) = client.wait_until_ready(&config.supervisor.poll).await {
            error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
        None
    };

    let state = ApiState {
        router: Arc::new(QueryRouter::new(client.clone())),
        accounts: Arc::new(InMemoryAccountService::seeded()),
        inference: Some(client),
    };

    info!("✅ Ollama ready");
    info!("📡 Starting API server...");

    let served = start_server(state, config.port, shutdown_signal()).await;

    supervisor.shutdown(daemon).await;

    served
}
