use actix_web::{http::header, web, HttpRequest, HttpResponse};
use tracing::info;

use crate::error::AppError;
use crate::AppState;

/// `POST /generateTrip`
pub async fn generate_trip(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = state.gateway
        .generate_trip(req.headers().get(header::AUTHORIZATION), &body)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// CORS preflight: empty 200, headers come from the middleware.
pub async fn preflight(req: HttpRequest) -> HttpResponse {
    info!(
        "Preflight from {}",
        req.headers()
            .get(header::ORIGIN)
            .and_then(|o| o.to_str().ok())
            .unwrap_or("unknown origin")
    );
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}
