use tokio::sync::{broadcast, mpsc};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;
use walkabout_server::config::ServerConfig;
use walkabout_server::relay::{run_relay, RelayBroadcast, RelayCommand};
use walkabout_server::ws::{router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid server configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();

    let (relay_tx, relay_rx) = mpsc::channel::<RelayCommand>(config.command_capacity);
    let (broadcast_tx, _) = broadcast::channel::<RelayBroadcast>(config.broadcast_capacity);

    let app_state = AppState {
        relay_tx,
        max_message_bytes: config.max_message_bytes,
        max_parse_errors: config.max_parse_errors,
    };

    tokio::spawn(async move {
        run_relay(relay_rx, broadcast_tx, config).await;
    });

    let app = router(app_state).layer(CorsLayer::permissive());

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Walkabout relay listening on {}", listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
