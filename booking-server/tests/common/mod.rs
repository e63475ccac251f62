//! Shared harness: the real router over an in-memory store and a pinned clock.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use booking_server::clock::FixedClock;
use booking_server::db::MemoryStore;
use booking_server::{AppState, create_router};
use chrono::{TimeZone, Utc};
use http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use shared::booking::BookingPolicy;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const DATE: &str = "2025-12-24";
pub const TIME: &str = "18:30";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

/// Clock at 2025-12-01 12:00 UTC, default house rules, any CORS origin.
pub fn app() -> TestApp {
    app_with_cors("*")
}

pub fn app_with_cors(origins: &str) -> TestApp {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap(),
    ));
    let state = AppState::with_parts(
        Arc::new(MemoryStore::new()),
        BookingPolicy::default(),
        clock.clone(),
        JWT_SECRET.to_string(),
        12,
    );
    TestApp {
        router: create_router(state.clone(), origins),
        state,
        clock,
    }
}

impl TestApp {
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(uri, Some(body), None).await
    }

    pub async fn post_admin(&self, uri: &str, body: Value, token: &str) -> (StatusCode, Value) {
        self.send(uri, Some(body), Some(token)).await
    }

    pub async fn send(
        &self,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Create the admin account and log in, returning the bearer token.
    pub async fn admin_token(&self) -> String {
        self.state
            .booking
            .bootstrap_admin("manager", "correct-horse")
            .await
            .unwrap();
        let (status, body) = self
            .post(
                "/api/admin-login",
                json!({"username": "manager", "password": "correct-horse"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn booking(name: &str, phone: &str) -> Value {
    json!({
        "name": name,
        "phone": phone,
        "email": "guest@example.com",
        "date": DATE,
        "time": TIME,
        "guests": 2,
    })
}

/// Fill the default slot to capacity (5 tables), returning the reservation ids.
pub async fn fill_slot(app: &TestApp) -> Vec<i64> {
    let mut ids = Vec::new();
    for n in 0..5 {
        let phone = format!("0101000000{n}");
        let (status, body) = app
            .post("/api/create-reservation", booking(&format!("Guest {n}"), &phone))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        ids.push(body["reservation"]["id"].as_i64().unwrap());
    }
    ids
}
