use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trip_gateway::gateway::{security_headers, OriginAllowList};
use trip_gateway::{AppError, AppState, Settings};

#[actix_web::main]
async fn main() -> trip_gateway::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);
    if config.generation.api_key.is_none() {
        warn!("generation.api_key is not set; trip generation will fail with a configuration error");
    }

    // Initialize application state
    let state = AppState::new(config.clone())?;
    info!(
        "Generation candidates: {} (rate limit {} per {}s)",
        config.generation.models.join(", "),
        config.rate_limit.max_requests,
        config.rate_limit.window_secs
    );
    let state = web::Data::new(state);

    // Sweep expired rate windows once per window
    let sweeper = state.clone();
    let sweep_every = Duration::from_secs(config.rate_limit.window_secs.max(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_every).await;
            let removed = sweeper.gateway.rate_limiter().cleanup().await;
            if removed > 0 {
                debug!("Removed {} expired rate windows", removed);
            }
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Trip gateway listening on http://{}:{}/generateTrip", config.server.host, config.server.port);

    let allowed_origins = config.cors.allowed_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(security_headers())
            .wrap(OriginAllowList::new(allowed_origins.clone()))
            .app_data(state.clone())
            .configure(trip_gateway::configure)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
