//! Authentication module for the trip gateway
//!
//! This module turns bearer credentials into verified subject ids
//! and keeps per-subject request windows.

mod service;
mod rate_limit;

pub use service::{
    bearer_token, build_verifier, Claims, IdentityToolkitVerifier, IdentityVerifier,
    JwtIdentityVerifier,
};
pub use rate_limit::{RateLimiter, RateLimitConfig, RateLimitDecision};
