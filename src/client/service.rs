use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use url::Url;

use crate::error::AppError;
use crate::trip::{GenerationResult, NewTrip, Trip};
use crate::Result;
use super::cache::TripHistory;

/// A signed-in user as seen by the client: the uid and a fresh ID token.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub uid: String,
    pub id_token: String,
}

#[derive(Debug, Serialize)]
struct TripRequestPayload<'a> {
    budget: f64,
    days: u32,
    interests: &'a str,
    uid: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client-side flow: ask the gateway for an itinerary, persist it, and read
/// trip history through the cache.
pub struct TripPlannerClient {
    client: Client,
    endpoint: Url,
    history: Arc<TripHistory>,
}

impl TripPlannerClient {
    pub fn new(client: Client, gateway_url: &Url, history: Arc<TripHistory>) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: gateway_url.join("generateTrip")?,
            history,
        })
    }

    pub fn history(&self) -> &Arc<TripHistory> {
        &self.history
    }

    #[instrument(skip(self, session, interests), fields(uid = %session.uid))]
    pub async fn generate_trip(
        &self,
        session: &ClientSession,
        budget: f64,
        days: u32,
        interests: &str,
    ) -> Result<Trip> {
        let res = self.client.post(self.endpoint.clone())
            .bearer_auth(&session.id_token)
            .json(&TripRequestPayload {
                budget,
                days,
                interests,
                uid: &session.uid,
            })
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("gateway request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| "Failed to generate trip".to_string());
            error!("Gateway rejected trip request with {}: {}", status, message);
            return Err(AppError::GatewayError {
                status: status.as_u16(),
                message,
            });
        }

        let generated: GenerationResult = res
            .json()
            .await
            .map_err(|e| AppError::InternalError(format!("unreadable gateway response: {}", e)))?;

        let saved = self.history
            .save_trip(&session.uid, NewTrip::from(generated))
            .await?;
        info!("Saved trip {}", saved.id);
        Ok(saved)
    }

    pub async fn get_trip(&self, session: &ClientSession, trip_id: &str) -> Result<Trip> {
        Ok(self.history.get_trip(&session.uid, trip_id).await?)
    }

    pub async fn list_trips(&self, session: &ClientSession, force_refresh: bool) -> Result<Arc<Vec<Trip>>> {
        Ok(self.history.list_trips(&session.uid, force_refresh).await?)
    }
}
