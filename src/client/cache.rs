use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::StoreError;
use crate::trip::{NewTrip, Trip};
use super::store::TripStore;

struct CacheEntry {
    trips: Arc<Vec<Trip>>,
    fetched_at: DateTime<Utc>,
}

#[derive(Default)]
struct Entries {
    lists: HashMap<String, CacheEntry>,
    // Bumped on every invalidation. A fetch that started under an older
    // value is returned to its caller but not cached.
    generations: HashMap<String, u64>,
}

impl Entries {
    fn generation(&self, subject_id: &str) -> u64 {
        self.generations.get(subject_id).copied().unwrap_or(0)
    }
}

/// Read-through cache of each subject's trip list.
///
/// Entries are served for `ttl` after the fetch. Writes go through
/// [`TripHistory::save_trip`], which drops the subject's entry once the store
/// confirms the write, so the next read always refetches. A read whose store
/// fetch overlaps an invalidation for the same subject does not repopulate
/// the entry.
pub struct TripHistory {
    store: Arc<dyn TripStore>,
    entries: RwLock<Entries>,
    ttl: Duration,
    list_limit: usize,
}

impl TripHistory {
    pub fn new(store: Arc<dyn TripStore>, ttl: Duration, list_limit: usize) -> Self {
        Self {
            store,
            entries: RwLock::new(Entries::default()),
            ttl,
            list_limit,
        }
    }

    pub fn from_config(store: Arc<dyn TripStore>, config: &CacheConfig) -> Self {
        Self::new(store, Duration::seconds(config.ttl_secs as i64), config.list_limit)
    }

    /// Newest first.
    pub async fn list_trips(&self, subject_id: &str, force_refresh: bool) -> Result<Arc<Vec<Trip>>, StoreError> {
        self.list_trips_at(subject_id, force_refresh, Utc::now()).await
    }

    pub async fn list_trips_at(
        &self,
        subject_id: &str,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<Arc<Vec<Trip>>, StoreError> {
        let generation = {
            let entries = self.entries.read().await;
            if !force_refresh {
                if let Some(entry) = entries.lists.get(subject_id) {
                    if now - entry.fetched_at < self.ttl {
                        debug!("Serving cached trips for {}", subject_id);
                        return Ok(entry.trips.clone());
                    }
                }
            }
            entries.generation(subject_id)
        };

        let mut trips = self.store.list_trips(subject_id, self.list_limit).await?;
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let trips = Arc::new(trips);

        let mut entries = self.entries.write().await;
        if entries.generation(subject_id) == generation {
            entries.lists.insert(
                subject_id.to_string(),
                CacheEntry {
                    trips: trips.clone(),
                    fetched_at: now,
                },
            );
        } else {
            debug!("Trips for {} changed during fetch, not caching", subject_id);
        }
        Ok(trips)
    }

    pub async fn save_trip(&self, subject_id: &str, trip: NewTrip) -> Result<Trip, StoreError> {
        let saved = self.store.add_trip(subject_id, trip).await?;
        self.invalidate(subject_id).await;
        Ok(saved)
    }

    pub async fn invalidate(&self, subject_id: &str) {
        let mut entries = self.entries.write().await;
        *entries.generations.entry(subject_id.to_string()).or_insert(0) += 1;
        if entries.lists.remove(subject_id).is_some() {
            debug!("Dropped cached trips for {}", subject_id);
        }
    }

    pub async fn get_trip(&self, subject_id: &str, trip_id: &str) -> Result<Trip, StoreError> {
        self.store
            .get_trip(subject_id, trip_id)
            .await?
            .ok_or(StoreError::NotFound)
    }
}
