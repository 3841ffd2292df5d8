mod api;
mod config;
mod device;
mod dispatch;
mod error;
mod events;
mod gate;
mod intent;

use api::AppState;
use config::BridgeConfig;
use device::DeviceSession;
use dispatch::CommandDispatcher;
use gate::ActionGate;
use intent::IntentDebouncer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = BridgeConfig::load();

    info!("lightbridge starting");
    info!(
        "  discovery: {}:{} (timeout {:?})",
        config.discovery.group, config.discovery.port, config.discovery.timeout
    );
    info!("  control surface: {}", config.http_bind);

    // The first device to answer is bound for the process lifetime; without
    // one there is nothing to control.
    let session = DeviceSession::establish(&config.discovery, config.session.clone()).await?;

    let mut state_rx = session.state_changes();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow();
            info!(?state, "device session state");
        }
    });

    let gate = ActionGate::new(&config.gate);
    let dispatcher = Arc::new(CommandDispatcher::new(
        gate,
        Arc::new(session),
        config.brightness.clone(),
    ));

    let (event_tx, event_rx) = mpsc::channel(64);
    let debouncer = IntentDebouncer::new(config.debounce.min_delta, config.debounce.max_delta);
    tokio::spawn(dispatch::run_pipeline(event_rx, debouncer, dispatcher.clone()));

    let state = AppState {
        dispatcher,
        events: event_tx,
    };
    let app = api::build_router(state);

    let addr: SocketAddr = config.http_bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "control surface listening");
    axum::serve(listener, app).await?;

    Ok(())
}
