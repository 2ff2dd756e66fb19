use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::Service;
use uuid::Uuid;

use models::user::UserRole;
use server::{routes, state::AppState};
use service::booking::BookingConfig;
use service::retry::RetryPolicy;
use service::store::{memory::InMemoryStore, Store};

struct TestApp {
    app: Router,
    store: Arc<InMemoryStore>,
    customer: Uuid,
    other_customer: Uuid,
    admin: Uuid,
    tech: Uuid,
}

fn build_app(require_paid_billing: bool) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let user = |role| {
        let id = Uuid::new_v4();
        store.add_user(id, role);
        id
    };
    let customer = user(UserRole::Customer);
    let other_customer = user(UserRole::Customer);
    let admin = user(UserRole::Admin);
    let tech = user(UserRole::Technician);
    let dyn_store: Arc<dyn Store> = store.clone();
    let state = AppState::new(dyn_store, BookingConfig { require_paid_billing, retry: RetryPolicy::none() });
    let app = routes::build_router(state, tower_http::cors::CorsLayer::very_permissive());
    TestApp { app, store, customer, other_customer, admin, tech }
}

impl TestApp {
    async fn send(&mut self, method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(u) = user {
            req = req.header("x-user-id", u.to_string());
        }
        let req = match body {
            Some(b) => req.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = self.app.call(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    async fn create_booking(&mut self) -> String {
        let body = json!({
            "car_id": Uuid::new_v4(),
            "service_id": Uuid::new_v4(),
            "scheduled_at": (Utc::now() + Duration::days(2)).to_rfc3339(),
            "customer_notes": "oil change"
        });
        let (status, b) = self.send("POST", "/bookings", Some(self.customer), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{b}");
        b["id"].as_str().unwrap().to_string()
    }

    async fn confirmed_booking(&mut self) -> String {
        let id = self.create_booking().await;
        let body = json!({ "technician_ids": [self.tech] });
        let (status, agg) = self.send("POST", &format!("/bookings/{id}/confirm"), Some(self.admin), Some(body)).await;
        assert_eq!(status, StatusCode::OK, "{agg}");
        id
    }
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let mut t = build_app(false);
    let (status, body) = t.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, doc) = t.send("GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/bookings/{id}/confirm"].is_object());
}

#[tokio::test]
async fn caller_header_is_required_and_resolved() {
    let mut t = build_app(false);
    let (status, body) = t.send("GET", "/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
    let (status, _) = t.send("GET", "/bookings", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, list) = t.send("GET", "/bookings", Some(t.customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn quote_to_billing_flow() {
    let mut t = build_app(true);
    let id = t.confirmed_booking().await;

    let change = json!({ "requested_at": (Utc::now() + Duration::days(6)).to_rfc3339() });
    let uri = format!("/bookings/{id}/change-requests");
    let (status, cr) = t.send("POST", &uri, Some(t.customer), Some(change.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cr["status"], "PENDING");
    let (status, err) = t.send("POST", &uri, Some(t.customer), Some(change)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "conflict");

    let (status, quote) = t
        .send("POST", &format!("/bookings/{id}/quotes"), Some(t.tech), Some(json!({ "amount": 1500 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let quote_id = quote["id"].as_str().unwrap().to_string();

    let accept = format!("/quotes/{quote_id}/accept");
    let (status, accepted) = t.send("POST", &accept, Some(t.customer), None).await;
    assert_eq!(status, StatusCode::OK, "{accepted}");
    assert_eq!(accepted["quote"]["status"], "APPROVED");
    assert_eq!(accepted["billing"]["status"], "UNPAID");
    assert_eq!(accepted["billing"]["amount"], 1500);
    let (status, _) = t.send("POST", &accept, Some(t.customer), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, err) = t.send("POST", &format!("/bookings/{id}/complete"), Some(t.tech), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_transition");

    let billing_id = accepted["billing"]["id"].as_str().unwrap().to_string();
    let (status, paid) = t.send("POST", &format!("/billings/{billing_id}/pay"), Some(t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "PAID");

    let (status, done) = t.send("POST", &format!("/bookings/{id}/complete"), Some(t.tech), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");

    let (_, agg) = t.send("GET", &format!("/bookings/{id}"), Some(t.admin), None).await;
    assert_eq!(agg["billings"].as_array().unwrap().len(), 1);
    assert_eq!(agg["technicians"][0]["is_primary"], true);

    let (_, inbox) = t.send("GET", "/notifications", Some(t.tech), None).await;
    let titles: Vec<&str> = inbox.as_array().unwrap().iter().filter_map(|n| n["title"].as_str()).collect();
    assert!(titles.contains(&"Quote accepted"));
    assert!(titles.contains(&"New assignment"));
}

#[tokio::test]
async fn rejected_booking_cannot_be_confirmed() {
    let mut t = build_app(false);
    let id = t.create_booking().await;
    let (status, b) = t
        .send("POST", &format!("/bookings/{id}/reject"), Some(t.admin), Some(json!({ "reason": "fully booked" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(b["status"], "REJECTED");
    let (status, err) = t
        .send("POST", &format!("/bookings/{id}/confirm"), Some(t.admin), Some(json!({ "technician_ids": [t.tech] })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("REJECTED"));
}

#[tokio::test]
async fn invalid_target_is_bad_request() {
    let mut t = build_app(false);
    let body = json!({
        "car_id": Uuid::new_v4(),
        "service_id": Uuid::new_v4(),
        "pack_id": Uuid::new_v4(),
        "scheduled_at": Utc::now().to_rfc3339()
    });
    let (status, err) = t.send("POST", "/bookings", Some(t.customer), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation");
}

#[tokio::test]
async fn foreign_booking_looks_missing() {
    let mut t = build_app(false);
    let id = t.create_booking().await;
    let (s1, foreign) = t.send("GET", &format!("/bookings/{id}"), Some(t.other_customer), None).await;
    let (s2, missing) = t.send("GET", &format!("/bookings/{}", Uuid::new_v4()), Some(t.other_customer), None).await;
    assert_eq!(s1, StatusCode::NOT_FOUND);
    assert_eq!(s1, s2);
    assert_eq!(foreign, missing);
}

#[tokio::test]
async fn cancel_without_body_and_notification_reads() {
    let mut t = build_app(false);
    let id = t.confirmed_booking().await;
    let (status, b) = t.send("POST", &format!("/bookings/{id}/cancel"), Some(t.customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(b["status"], "CANCELLED");

    let (_, count) = t.send("GET", "/notifications/unread-count", Some(t.tech), None).await;
    assert_eq!(count["count"], 2);
    let (_, inbox) = t.send("GET", "/notifications", Some(t.tech), None).await;
    assert_eq!(inbox[0]["title"], "Booking cancelled");
    let first = inbox[0]["id"].as_str().unwrap().to_string();

    let (status, _) = t.send("POST", &format!("/notifications/{first}/read"), Some(t.customer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, n) = t.send("POST", &format!("/notifications/{first}/read"), Some(t.tech), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(n["read"], true);
    let (_, changed) = t.send("POST", "/notifications/read-all", Some(t.tech), None).await;
    assert_eq!(changed["count"], 1);
}

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    let mut t = build_app(false);
    t.store.fail_next(1);
    let (status, err) = t.send("GET", "/bookings", Some(t.admin), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["error"], "transient");
    let (status, _) = t.send("GET", "/bookings", Some(t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
}
