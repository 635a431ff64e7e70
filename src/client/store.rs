use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::trip::{NewTrip, Trip};

/// Document store holding trips under `users/{uid}/trips/{id}`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Writes a new trip and returns it with its store-assigned id.
    async fn add_trip(&self, subject_id: &str, trip: NewTrip) -> Result<Trip, StoreError>;

    async fn get_trip(&self, subject_id: &str, trip_id: &str) -> Result<Option<Trip>, StoreError>;

    /// At most `limit` trips, in whatever order the store keeps them.
    async fn list_trips(&self, subject_id: &str, limit: usize) -> Result<Vec<Trip>, StoreError>;
}

pub fn collection_path(subject_id: &str) -> String {
    format!("users/{}/trips", subject_id)
}

/// Process-local store, handy for development and tests. Listing returns
/// trips in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTripStore {
    collections: RwLock<HashMap<String, Vec<Trip>>>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn add_trip(&self, subject_id: &str, trip: NewTrip) -> Result<Trip, StoreError> {
        let trip = trip.with_id(Uuid::new_v4().simple().to_string());
        self.collections
            .write()
            .await
            .entry(collection_path(subject_id))
            .or_default()
            .push(trip.clone());
        Ok(trip)
    }

    async fn get_trip(&self, subject_id: &str, trip_id: &str) -> Result<Option<Trip>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection_path(subject_id))
            .and_then(|trips| trips.iter().find(|trip| trip.id == trip_id))
            .cloned())
    }

    async fn list_trips(&self, subject_id: &str, limit: usize) -> Result<Vec<Trip>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection_path(subject_id))
            .map(|trips| trips.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
