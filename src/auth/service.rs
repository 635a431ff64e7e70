use crate::config::{AuthConfig, IdentityStrategy};
use crate::error::{AppError, AuthError};
use actix_web::http::header::HeaderValue;
use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Exchanges an opaque bearer credential for the verified subject id.
///
/// Implementations must fail closed: any transport or provider problem is
/// reported as an authentication failure, never as a pass.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<String, AuthError>;
}

/// Pulls the credential out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    header
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

pub fn build_verifier(config: &AuthConfig) -> Result<Arc<dyn IdentityVerifier>, AppError> {
    match config.strategy {
        IdentityStrategy::IdentityToolkit => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                AppError::ConfigError("auth.api_key is required for identity_toolkit".into())
            })?;
            let base_url = Url::parse(&config.identity_url)?;
            Ok(Arc::new(IdentityToolkitVerifier::new(base_url, api_key)?))
        }
        IdentityStrategy::Jwt => {
            let secret = config.jwt_secret.clone().ok_or_else(|| {
                AppError::ConfigError("auth.jwt_secret is required for jwt".into())
            })?;
            Ok(Arc::new(JwtIdentityVerifier::new(secret)))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

/// Verifies ID tokens with a remote `accounts:lookup` call.
pub struct IdentityToolkitVerifier {
    client: reqwest::Client,
    lookup_url: Url,
    api_key: String,
}

impl IdentityToolkitVerifier {
    pub fn new(base_url: Url, api_key: String) -> Result<Self, AppError> {
        let lookup_url = base_url.join("v1/accounts:lookup")?;
        Ok(Self {
            client: reqwest::Client::new(),
            lookup_url,
            api_key,
        })
    }
}

#[async_trait]
impl IdentityVerifier for IdentityToolkitVerifier {
    async fn verify(&self, credential: &str) -> Result<String, AuthError> {
        let res = self.client.post(self.lookup_url.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token: credential })
            .send()
            .await
            .map_err(|e| {
                warn!("Identity lookup request failed: {}", e);
                AuthError::VerificationFailed(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            debug!("Identity authority rejected token with status {}", status);
            return Err(AuthError::InvalidToken(format!("identity authority returned {}", status)));
        }

        let lookup: LookupResponse = res.json().await.map_err(|e| {
            warn!("Identity lookup returned an unreadable body: {}", e);
            AuthError::VerificationFailed(e.to_string())
        })?;

        lookup.users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("no user for token".into()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject id
    pub exp: i64,     // Expiration time
    pub iat: i64,     // Issued at
}

/// Local HS256 verification; no network round trip.
pub struct JwtIdentityVerifier {
    jwt_secret: String,
}

impl JwtIdentityVerifier {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(claims.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<String, AuthError> {
        let claims = self.decode_token(credential)?;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }
        Ok(claims.sub)
    }
}
