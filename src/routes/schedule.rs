// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Template and calendar routes.

use crate::error::Result;
use crate::middleware::{AuthUser, ValidatedJson};
use crate::models::{ScheduledEntry, TemplateExerciseSpec, WorkoutTemplate};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/templates", post(create_template))
        .route("/api/templates/{id}", get(get_template))
        .route("/api/schedule", post(schedule_workout))
        .route("/api/schedule/{id}", delete(unschedule))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TemplateExerciseInput {
    #[validate(length(min = 1, max = 200))]
    pub exercise_id: String,
    /// Defaults to the position in the list
    #[serde(default)]
    pub order: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub sets: u32,
    #[validate(range(min = 1, max = 1000))]
    pub reps: u32,
    /// Seconds
    #[serde(default)]
    #[validate(range(max = 3600))]
    pub rest_time: Option<u32>,
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
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50), nested)]
    pub exercises: Vec<TemplateExerciseInput>,
}

impl CreateTemplateRequest {
    fn exercise_specs(&self) -> Vec<TemplateExerciseSpec> {
        self.exercises
            .iter()
            .enumerate()
            .map(|(index, e)| TemplateExerciseSpec {
                exercise_id: e.exercise_id.clone(),
                order: e.order.unwrap_or(index as u32),
                sets: e.sets,
                reps: e.reps,
                rest_time: e.rest_time.unwrap_or(0),
                notes: e.notes.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ScheduleWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub template_id: String,
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<WorkoutTemplate>)> {
    let exercises = req.exercise_specs();
    let template = state
        .schedule
        .create_template(&user.user_id, req.name, req.description, exercises)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutTemplate>> {
    Ok(Json(state.schedule.get_template(&id, &user.user_id).await?))
}

async fn schedule_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<ScheduleWorkoutRequest>,
) -> Result<(StatusCode, Json<ScheduledEntry>)> {
    let entry = state
        .schedule
        .schedule_workout(&user.user_id, &req.template_id, req.date)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn unschedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.schedule.unschedule(&id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
