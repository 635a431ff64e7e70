use std::sync::Arc;

use chrono::Duration;
use reqwest::Client;
use serde_json::json;
use trip_gateway::client::{ClientSession, InMemoryTripStore, TripHistory, TripPlannerClient, TripStore};
use trip_gateway::error::{AppError, StoreError};
use url::Url;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn session() -> ClientSession {
    ClientSession {
        uid: "user-1".to_string(),
        id_token: "id-token-1".to_string(),
    }
}

fn planner(server: &MockServer, store: Arc<InMemoryTripStore>) -> TripPlannerClient {
    let history = Arc::new(TripHistory::new(store, Duration::seconds(60), 10));
    TripPlannerClient::new(Client::new(), &Url::parse(&server.uri()).unwrap(), history).unwrap()
}

fn generated(created_at: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "budget": 1500.0,
        "days": 5,
        "interests": "hiking, local food, museums",
        "itinerary": "# Your 5-Day Trip",
        "createdAt": created_at,
        "uid": "user-1"
    }))
}

#[tokio::test]
async fn test_generate_trip_persists_and_refreshes_history() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generateTrip"))
        .and(header("authorization", "Bearer id-token-1"))
        .and(body_json(json!({
            "budget": 1500.0,
            "days": 5,
            "interests": "hiking, local food, museums",
            "uid": "user-1"
        })))
        .respond_with(generated("2026-05-02T09:00:00Z"))
        .expect(1)
        .mount(&gateway)
        .await;

    let store = Arc::new(InMemoryTripStore::new());
    let planner = planner(&gateway, store.clone());
    let session = session();

    // history is empty and now cached
    assert!(planner.list_trips(&session, false).await.unwrap().is_empty());

    let trip = planner
        .generate_trip(&session, 1500.0, 5, "hiking, local food, museums")
        .await
        .unwrap();
    assert!(!trip.id.is_empty());
    assert_eq!(trip.itinerary, "# Your 5-Day Trip");
    assert_eq!(trip.uid, "user-1");

    // the write dropped the cached empty list
    let trips = planner.list_trips(&session, false).await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].id, trip.id);

    let again = planner.list_trips(&session, false).await.unwrap();
    assert!(Arc::ptr_eq(&trips, &again));

    // dropping the entry by hand forces the next read back to the store
    planner.history().invalidate("user-1").await;
    let refetched = planner.list_trips(&session, false).await.unwrap();
    assert!(!Arc::ptr_eq(&trips, &refetched));
    assert_eq!(refetched[0].id, trip.id);

    assert_eq!(planner.get_trip(&session, &trip.id).await.unwrap(), trip);
    assert_eq!(store.list_trips("user-1", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generateTrip"))
        .respond_with(generated("2026-05-02T09:00:00Z"))
        .up_to_n_times(1)
        .mount(&gateway)
        .await;
    Mock::given(method("POST"))
        .and(path("/generateTrip"))
        .respond_with(generated("2026-06-10T09:00:00Z"))
        .mount(&gateway)
        .await;

    let planner = planner(&gateway, Arc::new(InMemoryTripStore::new()));
    let session = session();
    let older = planner.generate_trip(&session, 1500.0, 5, "hiking, local food, museums").await.unwrap();
    let newer = planner.generate_trip(&session, 1500.0, 5, "hiking, local food, museums").await.unwrap();

    let trips = planner.list_trips(&session, true).await.unwrap();
    let ids: Vec<_> = trips.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn test_gateway_error_is_surfaced() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generateTrip"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "status": 429, "message": "Too many requests. Please try again in 30 seconds." }
        })))
        .mount(&gateway)
        .await;

    let store = Arc::new(InMemoryTripStore::new());
    let planner = planner(&gateway, store.clone());

    let err = planner
        .generate_trip(&session(), 1500.0, 5, "hiking, local food, museums")
        .await
        .unwrap_err();
    match err {
        AppError::GatewayError { status, message } => {
            assert_eq!(status, 429);
            assert!(message.starts_with("Too many requests"));
        }
        other => panic!("expected gateway error, got {:?}", other),
    }

    // nothing was written
    assert!(store.list_trips("user-1", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_trip_is_not_found() {
    let gateway = MockServer::start().await;
    let planner = planner(&gateway, Arc::new(InMemoryTripStore::new()));

    let err = planner.get_trip(&session(), "missing").await.unwrap_err();
    assert!(matches!(err, AppError::StoreError(StoreError::NotFound)));
}
