use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use event_gateway::config::Config;
use event_gateway::gateway::LivenessSupervisor;
use event_gateway::store::MemoryStore;
use event_gateway::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let store = match &config.seed_file {
        Some(path) => {
            let store = MemoryStore::from_seed_file(path).expect("failed to load seed file");
            tracing::info!(path = %path.display(), "memory store seeded");
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new()),
    };

    let liveness_interval = config.liveness_interval();
    let state = AppState::new(config, store.clone(), store);

    let supervisor = LivenessSupervisor::new(state.directory.clone(), liveness_interval);
    supervisor.start();

    let app = event_gateway::routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "event-gateway listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    supervisor.stop();
    tracing::info!("event-gateway stopped");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
