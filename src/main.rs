use axum::Router;
use tokio::net::TcpListener;

use anyhow::anyhow;

use yapbattle::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Load configuration
    let config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    let address = config.address();

    // Create application state
    let app_state = AppState::new(config);

    // Public health check route
    let public_routes =
        Router::new().route("/", axum::routing::get(yapbattle::handlers::api::health_check));

    // Combine all routes: public + api + websocket
    let app = public_routes
        .merge(routes::api::create_api_router())
        .merge(routes::ws::create_ws_router())
        .with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
