// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
};
use chrono::{DateTime, Utc};
use gymlog::clock::ManualClock;
use gymlog::config::Config;
use gymlog::db::FirestoreDb;
use gymlog::middleware::auth::create_jwt;
use gymlog::routes::create_router;
use gymlog::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Fixed start time for the manual clock.
#[allow(dead_code)]
pub fn test_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_773_050_400, 0).unwrap()
}

/// Test app over the in-memory backend.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
}

/// Create a test app with default config.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default())
}

/// Create a test app with the given config, in-memory storage and a manual clock.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::new(test_epoch()));
    let state = Arc::new(
        AppState::new(config, FirestoreDb::new_in_memory(), clock.clone())
            .expect("Failed to build app state"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

/// Create a JWT for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).unwrap()
}

/// Response pieces most tests look at.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// Send a request as `user_id` (or anonymously) and decode the JSON body.
    #[allow(dead_code)]
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", create_test_jwt(user_id)),
            );
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    #[allow(dead_code)]
    pub async fn post(&self, uri: &str, user_id: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(user_id), Some(body)).await
    }

    #[allow(dead_code)]
    pub async fn get(&self, uri: &str, user_id: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(user_id), None).await
    }

    /// Create a template and schedule it for `date`; returns the entry ID.
    #[allow(dead_code)]
    pub async fn schedule(&self, user_id: &str, exercises: Value, date: &str) -> String {
        let template = self
            .post(
                "/api/templates",
                user_id,
                serde_json::json!({ "name": "Test workout", "exercises": exercises }),
            )
            .await;
        assert_eq!(template.status, StatusCode::CREATED, "{}", template.body);

        let entry = self
            .post(
                "/api/schedule",
                user_id,
                serde_json::json!({
                    "templateId": template.body["id"],
                    "date": date,
                }),
            )
            .await;
        assert_eq!(entry.status, StatusCode::CREATED, "{}", entry.body);
        entry.body["id"].as_str().unwrap().to_string()
    }
}
