// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Template and calendar routes.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::create_test_app;

#[tokio::test]
async fn test_second_workout_on_same_day_conflicts() {
    let app = create_test_app();
    app.schedule("alice", json!([{"exerciseId": "squat", "sets": 5, "reps": 5}]), "2026-03-09")
        .await;

    let template = app
        .post(
            "/api/templates",
            "alice",
            json!({"name": "Other", "exercises": [{"exerciseId": "row", "sets": 3, "reps": 8}]}),
        )
        .await;
    let again = app
        .post(
            "/api/schedule",
            "alice",
            json!({"templateId": template.body["id"], "date": "2026-03-09"}),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    // A different user has their own calendar.
    let bobs = app
        .post(
            "/api/templates",
            "bob",
            json!({"name": "Bob's", "exercises": [{"exerciseId": "row", "sets": 3, "reps": 8}]}),
        )
        .await;
    let bob_entry = app
        .post(
            "/api/schedule",
            "bob",
            json!({"templateId": bobs.body["id"], "date": "2026-03-09"}),
        )
        .await;
    assert_eq!(bob_entry.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_template_is_private() {
    let app = create_test_app();
    let created = app
        .post(
            "/api/templates",
            "alice",
            json!({
                "name": "Push",
                "description": "Chest day",
                "exercises": [
                    {"exerciseId": "bench", "sets": 3, "reps": 8, "restTime": 120},
                    {"exerciseId": "dips", "sets": 3, "reps": 12}
                ]
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let uri = format!("/api/templates/{}", created.body["id"].as_str().unwrap());

    let mine = app.get(&uri, "alice").await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["exercises"][1]["order"], 1);
    assert_eq!(mine.body["exercises"][0]["restTime"], 120);

    assert_eq!(app.get(&uri, "bob").await.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.get("/api/templates/missing", "alice").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_template_validation() {
    let app = create_test_app();

    let no_exercises = app
        .post("/api/templates", "alice", json!({"name": "Empty", "exercises": []}))
        .await;
    assert_eq!(no_exercises.status, StatusCode::BAD_REQUEST);

    let no_name = app
        .post(
            "/api/templates",
            "alice",
            json!({"name": "", "exercises": [{"exerciseId": "row", "sets": 3, "reps": 8}]}),
        )
        .await;
    assert_eq!(no_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_name.body["fields"], json!(["name"]));

    let bad_date = app
        .post("/api/schedule", "alice", json!({"templateId": "t", "date": "tomorrow"}))
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_date.body["error"], "bad_request");
}

#[tokio::test]
async fn test_unschedule() {
    let app = create_test_app();
    let entry_id = app
        .schedule("alice", json!([{"exerciseId": "squat", "sets": 5, "reps": 5}]), "2026-03-10")
        .await;
    let uri = format!("/api/schedule/{}", entry_id);

    let foreign = app.send(Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let removed = app.send(Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let gone = app.send(Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}
