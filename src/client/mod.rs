//! Client side of the trip planner
//!
//! Calls the gateway, persists generated trips to the document store and
//! serves trip history through a per-subject cache.

mod cache;
mod service;
mod store;

pub use cache::TripHistory;
pub use service::{ClientSession, TripPlannerClient};
pub use store::{collection_path, InMemoryTripStore, TripStore};
