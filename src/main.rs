use barraca_backend::api::{self, AppState};
use barraca_backend::config::Config;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Log startup info
    tracing::info!("Starting Barraca Backend");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("Gateway: {}", config.gateway.base_url);
    tracing::info!("Public base URL: {}", config.checkout.public_base_url);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // Build router
    let state = AppState::new(config)?;
    let app = api::router(state);

    // Start server
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
