use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::{header, StatusCode}};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Generation error: {0}")]
    GenerationError(#[from] GenerationError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Gateway returned {status}: {message}")]
    GatewayError { status: u16, message: String },

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(format!("invalid url: {}", err))
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

const CONFIGURATION_MESSAGE: &str = "Server configuration error. Please contact support.";
const GENERATION_MESSAGE: &str = "Failed to generate trip. Please try again.";

impl AppError {
    /// Message safe to hand back to the caller. Credential, configuration and
    /// upstream details stay in the server log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::MissingToken => "Unauthorized: Missing authentication token".to_string(),
                AuthError::InvalidToken(_) | AuthError::VerificationFailed(_) => {
                    "Unauthorized: Invalid authentication token".to_string()
                }
                AuthError::SubjectMismatch => "Forbidden: UID mismatch".to_string(),
                AuthError::RateLimited { retry_after_secs } => format!(
                    "Too many requests. Please try again in {} seconds.",
                    retry_after_secs
                ),
            },
            AppError::ValidationError(e) => e.to_string(),
            AppError::GenerationError(GenerationError::NotConfigured) => CONFIGURATION_MESSAGE.to_string(),
            AppError::GenerationError(_) => GENERATION_MESSAGE.to_string(),
            AppError::ConfigError(_) => CONFIGURATION_MESSAGE.to_string(),
            AppError::StoreError(StoreError::NotFound) => "Trip not found".to_string(),
            AppError::StoreError(_) => "Internal server error".to_string(),
            AppError::GatewayError { message, .. } => message.clone(),
            AppError::MethodNotAllowed => "Method not allowed".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

// Implement actix_web::ResponseError for AppError
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut error = json!({
            "status": status.as_u16(),
            "message": self.public_message()
        });
        if let AppError::ValidationError(e) = self {
            error["field"] = json!(e.field());
        }

        let mut builder = HttpResponse::build(status);
        if let AppError::AuthError(AuthError::RateLimited { retry_after_secs }) = self {
            builder.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        builder.json(json!({ "error": error }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::VerificationFailed(_) => StatusCode::UNAUTHORIZED,
                AuthError::SubjectMismatch => StatusCode::FORBIDDEN,
                AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            },
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::GenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StoreError(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::GatewayError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token verification failed: {0}")]
    VerificationFailed(String),

    #[error("Verified subject does not match claimed uid")]
    SubjectMismatch,

    #[error("Rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Field-level rejection of a trip request. The display text is returned to
/// the caller verbatim, so it must name the field and the violated rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    MalformedBody,

    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} must be an integer")]
    NotAnInteger(&'static str),

    #[error("{0} must be a string")]
    NotText(&'static str),

    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: i64 },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: i64, max: i64 },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MalformedBody => "body",
            ValidationError::Missing(field)
            | ValidationError::NotANumber(field)
            | ValidationError::NotAnInteger(field)
            | ValidationError::NotText(field) => field,
            ValidationError::BelowMinimum { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TooShort { field, .. } => field,
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation API key is not configured")]
    NotConfigured,

    #[error("No generation models configured")]
    NoCandidates,

    #[error("Model {model} returned {status}: {body}")]
    HttpStatus { model: String, status: u16, body: String },

    #[error("Model {model} returned no text")]
    EmptyResponse { model: String },

    #[error("Request to model {model} failed: {source}")]
    Transport {
        model: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("All {attempts} models failed, last error: {last}")]
    Unavailable {
        attempts: usize,
        #[source]
        last: Box<GenerationError>,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        // Test config error conversion
        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let app_err: AppError = ValidationError::Missing("budget").into();
        assert!(matches!(app_err, AppError::ValidationError(ValidationError::Missing("budget"))));
    }

    #[test]
    fn test_error_status_codes() {
        let err = AppError::AuthError(AuthError::MissingToken);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::VerificationFailed("timeout".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::SubjectMismatch);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = AppError::AuthError(AuthError::RateLimited { retry_after_secs: 12 });
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let err = AppError::ValidationError(ValidationError::NotANumber("budget"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::GenerationError(GenerationError::NotConfigured);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::StoreError(StoreError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        assert_eq!(AppError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError(ValidationError::OutOfRange { field: "days", min: 1, max: 30 });
        assert_eq!(err.to_string(), "Validation error: days must be between 1 and 30");

        let err = ValidationError::TooShort { field: "interests", min: 10 };
        assert_eq!(err.to_string(), "interests must be at least 10 characters");
        assert_eq!(err.field(), "interests");

        let err = AppError::StoreError(StoreError::NotFound);
        assert_eq!(err.to_string(), "Store error: Record not found");
    }

    #[test]
    fn test_public_message_hides_details() {
        let err = AppError::GenerationError(GenerationError::Unavailable {
            attempts: 3,
            last: Box::new(GenerationError::HttpStatus {
                model: "gemini-pro".into(),
                status: 503,
                body: "upstream secret detail".into(),
            }),
        });
        assert_eq!(err.public_message(), "Failed to generate trip. Please try again.");

        let err = AppError::ConfigError("generation.api_key missing".into());
        assert!(!err.public_message().contains("api_key"));

        let err = AppError::AuthError(AuthError::VerificationFailed("connection refused".into()));
        assert!(!err.public_message().contains("refused"));
    }

    #[test]
    fn test_rate_limited_response_carries_retry_after() {
        let err = AppError::AuthError(AuthError::RateLimited { retry_after_secs: 42 });
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap().to_str().unwrap(),
            "42"
        );
    }
}
