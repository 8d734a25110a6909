// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI workout generation, gated by the per-user quota.

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, ValidatedJson};
use crate::models::{GeneratedWorkout, WorkoutTemplate};
use crate::rate_limit::LimitStatus;
use crate::services::GenerationRequest;
use crate::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ai/generate-workout", post(generate_workout))
        .route("/api/ai/quota", get(get_quota))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWorkoutRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub request: GenerationRequest,
    /// Also store the result as a template owned by the caller
    #[serde(default)]
    pub save_as_template: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWorkoutResponse {
    pub workout: GeneratedWorkout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<WorkoutTemplate>,
}

#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    pub limits: Vec<LimitStatus>,
}

/// Generate a workout. The quota is charged before the model is called, and
/// every admitted or denied response carries the `X-RateLimit-*` headers.
async fn generate_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<GenerateWorkoutRequest>,
) -> Result<Response> {
    if !state.generator.is_configured() {
        return Err(AppError::Upstream(
            "AI generation is not configured".to_string(),
        ));
    }

    let admission = state.ai_quota.admit(&user.user_id);
    if !admission.allowed {
        return Err(AppError::RateLimited {
            limiter: admission.denied_by.unwrap_or("ai"),
            retry_after_secs: admission.retry_after_secs.unwrap_or(1),
            headers: admission.headers,
        });
    }

    let result = generate_and_save(&state, &user, req).await;
    let mut response = match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };
    response.headers_mut().extend(admission.headers);
    Ok(response)
}

async fn generate_and_save(
    state: &AppState,
    user: &AuthUser,
    req: GenerateWorkoutRequest,
) -> Result<GenerateWorkoutResponse> {
    let workout = state.generator.generate(&req.request).await?;

    let template = if req.save_as_template {
        let template = state
            .schedule
            .create_template(
                &user.user_id,
                workout.workout_name.clone(),
                Some(workout.workout_description.clone()).filter(|d| !d.is_empty()),
                workout.template_exercises(),
            )
            .await?;
        Some(template)
    } else {
        None
    };

    Ok(GenerateWorkoutResponse { workout, template })
}

/// Remaining AI quota for the caller. Does not consume quota.
async fn get_quota(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<QuotaResponse> {
    Json(QuotaResponse {
        limits: state.ai_quota.status(&user.user_id),
    })
}
