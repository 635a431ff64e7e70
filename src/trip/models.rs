use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw `POST /generateTrip` body. Fields stay untyped until the validator
/// has checked presence, type and range in a fixed order.
#[derive(Debug, Default, Deserialize)]
pub struct TripRequestBody {
    pub budget: Option<Value>,
    pub days: Option<Value>,
    pub interests: Option<Value>,
    pub uid: Option<Value>,
}

/// A request that passed every field check. Only the validator builds these.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    budget: f64,
    days: u32,
    interests: String,
    subject_id: String,
}

impl GenerationRequest {
    pub(crate) fn new(budget: f64, days: u32, interests: String, subject_id: String) -> Self {
        Self { budget, days, interests, subject_id }
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn interests(&self) -> &str {
        &self.interests
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub budget: f64,
    pub days: u32,
    pub interests: String,
    pub itinerary: String,
    pub created_at: DateTime<Utc>,
    pub uid: String,
}

impl GenerationResult {
    pub fn new(request: GenerationRequest, itinerary: String, created_at: DateTime<Utc>) -> Self {
        Self {
            budget: request.budget,
            days: request.days,
            interests: request.interests,
            itinerary,
            created_at,
            uid: request.subject_id,
        }
    }
}

/// A persisted itinerary as stored under `users/{uid}/trips/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub budget: f64,
    pub days: u32,
    pub interests: String,
    pub itinerary: String,
    pub created_at: DateTime<Utc>,
    pub uid: String,
}

/// Trip contents before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub budget: f64,
    pub days: u32,
    pub interests: String,
    pub itinerary: String,
    pub created_at: DateTime<Utc>,
    pub uid: String,
}

impl NewTrip {
    pub fn with_id(self, id: String) -> Trip {
        Trip {
            id,
            budget: self.budget,
            days: self.days,
            interests: self.interests,
            itinerary: self.itinerary,
            created_at: self.created_at,
            uid: self.uid,
        }
    }
}

impl From<GenerationResult> for NewTrip {
    fn from(result: GenerationResult) -> Self {
        Self {
            budget: result.budget,
            days: result.days,
            interests: result.interests,
            itinerary: result.itinerary,
            created_at: result.created_at,
            uid: result.uid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_result_wire_format() {
        let created_at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let request = GenerationRequest::new(1500.0, 5, "hiking, local food, museums".into(), "user-1".into());
        let result = GenerationResult::new(request, "# Plan".into(), created_at);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({
            "budget": 1500.0,
            "days": 5,
            "interests": "hiking, local food, museums",
            "itinerary": "# Plan",
            "createdAt": "2026-03-01T10:00:00Z",
            "uid": "user-1"
        }));
    }

    #[test]
    fn test_request_body_tolerates_missing_fields() {
        let body: TripRequestBody = serde_json::from_value(json!({ "budget": 200 })).unwrap();
        assert!(body.budget.is_some());
        assert!(body.days.is_none());
        assert!(body.uid.is_none());
    }
}
