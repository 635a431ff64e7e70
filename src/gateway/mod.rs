//! Trip-generation gateway
//!
//! The request pipeline behind `POST /generateTrip` plus the HTTP
//! surface (handlers, CORS allow-list, security headers) around it.

pub mod handlers;
pub mod middleware;
mod service;

pub use middleware::{security_headers, OriginAllowList};
pub use service::TripGateway;
