pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod proxy;
pub mod trip;

use std::sync::Arc;
use actix_web::{http::Method, web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{IdentityVerifier, RateLimiter, RateLimitConfig};
pub use gateway::TripGateway;
pub use trip::{GenerationRequest, GenerationResult, Trip};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Route table shared by the binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(
            web::resource("/generateTrip")
                .route(web::post().to(gateway::handlers::generate_trip))
                .route(web::method(Method::OPTIONS).to(gateway::handlers::preflight))
                .default_service(web::to(gateway::handlers::method_not_allowed)),
        );
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub gateway: Arc<TripGateway>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self> {
        let verifier = auth::build_verifier(&config.auth)?;
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::from(&config.rate_limit)));
        let generator = proxy::GenerationClient::from_config(&config.generation)?;

        Ok(Self::from_parts(
            config,
            TripGateway::new(verifier, rate_limiter, generator),
        ))
    }

    pub fn from_parts(config: Settings, gateway: TripGateway) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
        }
    }
}
