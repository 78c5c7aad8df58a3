use financial_query_agent::{
    accounts::{AccountProvider, InMemoryAccountService},
    config::AgentConfig,
    inference::InferenceClient,
    router::{QueryRoute, QueryRouter},
    supervisor::{PlatformProfile, ProcessSupervisor},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Answer a single question from the command line, e.g.
/// `ask what are my subscriptions`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so the answer on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        eprintln!("usage: ask <question>");
        std::process::exit(2);
    }

    let config = AgentConfig::from_env()?;

    let client = Arc::new(InferenceClient::new(config.inference.clone())?);
    let supervisor = ProcessSupervisor::new(
        PlatformProfile::current(config.inference.daemon_port()),
        client.clone(),
        &config.supervisor,
    );
    let accounts = InMemoryAccountService::seeded();
    let router = QueryRouter::new(client);

    // Canned queries never touch the daemon
    let route = QueryRoute::classify(&query);
    let daemon = if route == QueryRoute::Analysis && config.supervise {
        supervisor.ensure_running().await?
    } else {
        None
    };

    info!(?route, query = %query, "Running query");

    let snapshot = accounts.snapshot().await?;
    let result = router.handle(&query, &snapshot).await;

    println!("{}", result.text);

    supervisor.shutdown(daemon).await;

    if result.failed {
        std::process::exit(1);
    }

    Ok(())
}
