use std::sync::Arc;

use snowball_agent::{
    build_router,
    config::{load_addresses, Settings},
    services::{
        AgentRegistry, CdpProvider, ChainReader, EventHub, HttpCdpProvider, PositionMonitor,
        RpcChainReader,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snowball_agent=info,tower_http=info".into()),
        )
        .init();

    let settings = Arc::new(Settings::new());
    let addresses = load_addresses(settings.chain.addresses_path.as_deref())?;

    let provider: Arc<dyn CdpProvider> = Arc::new(HttpCdpProvider::new(&settings.a2a)?);
    let chain: Arc<dyn ChainReader> =
        Arc::new(RpcChainReader::new(&settings.chain.rpc_url, addresses)?);
    let registry = Arc::new(AgentRegistry::new());
    let events = Arc::new(EventHub::new());

    let monitor = Arc::new(PositionMonitor::new(
        Arc::clone(&chain),
        Arc::clone(&provider),
        Arc::clone(&registry),
        Arc::clone(&events),
        settings.monitor.clone(),
    ));
    monitor.spawn();

    let state = AppState {
        settings: Arc::clone(&settings),
        provider,
        chain,
        registry,
        events,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", settings.api.host, settings.api.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "agent backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
