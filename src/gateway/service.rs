use std::sync::Arc;

use actix_web::http::header::HeaderValue;
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::auth::{bearer_token, IdentityVerifier, RateLimitDecision, RateLimiter};
use crate::error::{AppError, AuthError, GenerationError};
use crate::proxy::GenerationClient;
use crate::trip::{build_prompt, parse_body, validate, GenerationResult};

/// Runs one trip-generation request through authentication, rate limiting,
/// validation, prompt rendering and generation. The first failing stage ends
/// the request; nothing is retried here.
pub struct TripGateway {
    verifier: Arc<dyn IdentityVerifier>,
    rate_limiter: Arc<RateLimiter>,
    generator: GenerationClient,
}

impl TripGateway {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        rate_limiter: Arc<RateLimiter>,
        generator: GenerationClient,
    ) -> Self {
        Self {
            verifier,
            rate_limiter,
            generator,
        }
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    #[instrument(skip_all, fields(subject_id = tracing::field::Empty))]
    pub async fn generate_trip(
        &self,
        authorization: Option<&HeaderValue>,
        body: &[u8],
    ) -> Result<GenerationResult, AppError> {
        let credential = bearer_token(authorization)?;
        let subject_id = self.verifier.verify(credential).await.map_err(|e| {
            warn!("Rejected credential: {}", e);
            e
        })?;
        tracing::Span::current().record("subject_id", subject_id.as_str());

        let now = Utc::now();
        let decision = self.rate_limiter.check_rate_limit_at(&subject_id, now).await;
        if let RateLimitDecision::Denied { count, .. } = decision {
            warn!("Rate limit exceeded for {} ({} attempts in window)", subject_id, count);
            return Err(AuthError::RateLimited {
                retry_after_secs: decision.retry_after_secs(now),
            }
            .into());
        }

        // A claimed uid that disagrees with the verified subject is refused
        // before any field check.
        let body = parse_body(body)?;
        if let Some(Value::String(claimed)) = &body.uid {
            if claimed != &subject_id {
                warn!("Claimed uid does not match verified subject {}", subject_id);
                return Err(AuthError::SubjectMismatch.into());
            }
        }

        let request = validate(&body)?;

        let prompt = build_prompt(&request);
        let itinerary = self.generator.generate(&prompt).await.map_err(|e| {
            match &e {
                GenerationError::NotConfigured => error!("Generation API key not configured"),
                _ => error!("Trip generation failed for {}: {}", subject_id, e),
            }
            e
        })?;

        info!("Generated {}-day itinerary for {}", request.days(), subject_id);
        Ok(GenerationResult::new(request, itinerary, Utc::now()))
    }
}
