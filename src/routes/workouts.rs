// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout logging routes: start, activate exercises, record sets, complete.

use crate::error::Result;
use crate::middleware::{AuthUser, ValidatedJson};
use crate::models::{LoggedExerciseDetail, LoggedSet, WorkoutLogDetail};
use crate::services::StartedSession;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Workout routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workout-logs/start", post(start_session))
        .route("/api/workout-logs/{id}", get(get_session))
        .route("/api/workout-logs/{id}/exercises", post(start_exercise))
        .route("/api/workout-logs/{id}/complete", post(complete_session))
        .route("/api/logged-exercises/{id}/sets", post(record_set))
        .route("/api/logged-sets/{id}", put(update_set))
}

// ─── Request Bodies ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, max = 200))]
    pub scheduled_workout_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StartExerciseRequest {
    #[validate(length(min = 1, max = 200))]
    pub exercise_id: String,
    #[validate(range(max = 1000))]
    pub order: u32,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecordSetRequest {
    #[validate(range(min = 1, max = 100))]
    pub set_number: u32,
    #[validate(range(max = 1000))]
    pub reps: u32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2000.0))]
    pub weight: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateSetRequest {
    #[validate(range(max = 1000))]
    pub reps: u32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2000.0))]
    pub weight: Option<f64>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompleteSessionRequest {
    /// Minutes
    #[serde(default)]
    #[validate(range(max = 1440))]
    pub duration: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

// ─── Handlers ────────────────────────────────────────────────

/// Start (or resume) the workout for a scheduled entry.
async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartedSession>)> {
    let started = state
        .workout_logs
        .start_session(&req.scheduled_workout_id, &user.user_id)
        .await?;

    let status = if started.resumed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(started)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutLogDetail>> {
    Ok(Json(state.workout_logs.get_session(&id, &user.user_id).await?))
}

async fn start_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<StartExerciseRequest>,
) -> Result<Json<LoggedExerciseDetail>> {
    let exercise = state
        .workout_logs
        .start_exercise(&id, &req.exercise_id, req.order, req.notes, &user.user_id)
        .await?;
    Ok(Json(exercise))
}

async fn record_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RecordSetRequest>,
) -> Result<(StatusCode, Json<LoggedSet>)> {
    let set = state
        .workout_logs
        .record_set(&id, req.set_number, req.reps, req.weight, &user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

async fn update_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateSetRequest>,
) -> Result<Json<LoggedSet>> {
    let set = state
        .workout_logs
        .update_set(&id, req.reps, req.weight, req.completed, &user.user_id)
        .await?;
    Ok(Json(set))
}

async fn complete_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CompleteSessionRequest>,
) -> Result<Json<WorkoutLogDetail>> {
    let log = state
        .workout_logs
        .complete_session(&id, req.duration, req.notes, &user.user_id)
        .await?;
    Ok(Json(log))
}
