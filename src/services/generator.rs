// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the AI workout generation API (Gemini `generateContent`).
//!
//! Handles:
//! - Prompt construction from the user's goal and exercise catalogue
//! - Request timeout
//! - Stripping markdown code fences around the returned JSON
//! - Dropping exercises that are not in the supplied catalogue
//!
//! Callers must pass the quota gate before calling [`WorkoutGenerator::generate`];
//! this client does no rate limiting of its own.

use crate::config::Config;
use crate::error::AppError;
use crate::models::GeneratedWorkout;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use validator::Validate;

/// An exercise the generated workout may use.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExercise {
    #[validate(length(min = 1, max = 200))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// What the user asked for.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[validate(length(min = 1, max = 500))]
    pub goal: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub experience_level: Option<String>,
    /// Target length in minutes
    #[serde(default)]
    #[validate(range(min = 5, max = 240))]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub equipment: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 500), nested)]
    pub available_exercises: Vec<CatalogExercise>,
}

#[derive(Clone)]
pub struct WorkoutGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl WorkoutGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.ai_api_url.clone(),
            config.ai_api_key.clone(),
            config.ai_model.clone(),
            Duration::from_secs(config.ai_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the model for a workout and parse its answer.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedWorkout, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("AI generation is not configured".to_string()))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(request) }] }],
            "generationConfig": {
                "temperature": 0.7,
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("AI request timed out".to_string())
                } else {
                    AppError::Upstream(format!("AI request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "AI generation request rejected");
            return Err(AppError::Upstream(format!("AI API returned HTTP {}", status)));
        }

        let reply: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed AI response: {}", e)))?;

        let text = reply
            .first_text()
            .ok_or_else(|| AppError::Upstream("AI response contained no candidates".to_string()))?;

        let mut workout = parse_generated_workout(text)?;
        retain_catalog_exercises(&mut workout, &request.available_exercises)?;

        tracing::info!(
            model = %self.model,
            exercises = workout.exercises.len(),
            "Workout generated"
        );
        Ok(workout)
    }
}

// ─── Gemini wire types ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

// ─── Prompt and parsing ──────────────────────────────────────────

pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Create a single gym workout for this goal: {}\n",
        request.goal.trim()
    );

    if let Some(level) = &request.experience_level {
        prompt.push_str(&format!("Experience level: {}\n", level));
    }
    if let Some(minutes) = request.duration_minutes {
        prompt.push_str(&format!("Target duration: {} minutes\n", minutes));
    }
    if !request.equipment.is_empty() {
        prompt.push_str(&format!(
            "Available equipment: {}\n",
            request.equipment.join(", ")
        ));
    }
    if !request.available_exercises.is_empty() {
        prompt.push_str("Only use exercises from this list (use the id exactly):\n");
        for exercise in &request.available_exercises {
            prompt.push_str(&format!("- {}: {}\n", exercise.id, exercise.name));
        }
    }

    prompt.push_str(
        "Respond with JSON only, shaped as \
         {\"workoutName\": string, \"workoutDescription\": string, \
         \"exercises\": [{\"exerciseId\": string, \"sets\": number, \"reps\": number, \
         \"restTime\": seconds, \"notes\": string}], \"totalDuration\": minutes}",
    );
    prompt
}

/// Remove a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse model output into a workout. Malformed output is an upstream
/// failure and is not retried.
pub fn parse_generated_workout(text: &str) -> Result<GeneratedWorkout, AppError> {
    let json = strip_code_fences(text);
    let workout: GeneratedWorkout = serde_json::from_str(json).map_err(|e| {
        tracing::warn!(error = %e, "Unparseable AI output");
        AppError::Upstream(format!("AI returned invalid workout JSON: {}", e))
    })?;

    if workout.exercises.is_empty() {
        return Err(AppError::Upstream(
            "AI returned a workout with no exercises".to_string(),
        ));
    }
    workout.validate().map_err(|e| {
        tracing::warn!(error = %e, "AI workout outside allowed targets");
        AppError::Upstream(format!("AI returned an invalid workout: {}", e))
    })?;
    Ok(workout)
}

fn retain_catalog_exercises(
    workout: &mut GeneratedWorkout,
    catalog: &[CatalogExercise],
) -> Result<(), AppError> {
    if catalog.is_empty() {
        return Ok(());
    }

    let known: HashSet<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
    workout.exercises.retain(|e| {
        let keep = known.contains(e.exercise_id.as_str());
        if !keep {
            tracing::warn!(exercise_id = %e.exercise_id, "Dropping unknown exercise from AI workout");
        }
        keep
    });

    if workout.exercises.is_empty() {
        return Err(AppError::Upstream(
            "AI workout used no exercises from the catalogue".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WORKOUT_JSON: &str = r#"{
        "workoutName": "Upper Body",
        "workoutDescription": "Push and pull",
        "exercises": [
            {"exerciseId": "bench", "sets": 3, "reps": 8, "restTime": 120},
            {"exerciseId": "row", "sets": 3, "reps": 10, "restTime": 90, "notes": "pause"}
        ],
        "totalDuration": 45
    }"#;

    fn request(catalog: &[&str]) -> GenerationRequest {
        GenerationRequest {
            goal: "Build strength".to_string(),
            experience_level: Some("intermediate".to_string()),
            duration_minutes: Some(45),
            equipment: vec!["barbell".to_string()],
            available_exercises: catalog
                .iter()
                .map(|id| CatalogExercise {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                })
                .collect(),
        }
    }

    fn gemini_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    fn generator(server: &MockServer, key: Option<&str>) -> WorkoutGenerator {
        WorkoutGenerator::new(
            server.uri(),
            key.map(str::to_string),
            "gemini-test",
            Duration::from_millis(500),
        )
        .unwrap()
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_fenced_workout() {
        let fenced = format!("```json\n{}\n```", WORKOUT_JSON);
        let workout = parse_generated_workout(&fenced).unwrap();
        assert_eq!(workout.workout_name, "Upper Body");
        assert_eq!(workout.exercises.len(), 2);
        assert_eq!(workout.exercises[1].notes.as_deref(), Some("pause"));
        assert_eq!(workout.total_duration, 45);
    }

    #[test]
    fn test_parse_failure_is_upstream() {
        let err = parse_generated_workout("Sure! Here is your workout.").unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));

        let err = parse_generated_workout(r#"{"workoutName":"x","exercises":[]}"#).unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_zero_set_exercise_is_upstream() {
        let err = parse_generated_workout(
            r#"{"workoutName":"x","exercises":[{"exerciseId":"bench","sets":0,"reps":8}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));

        let err = parse_generated_workout(
            r#"{"workoutName":"","exercises":[{"exerciseId":"bench","sets":3,"reps":8}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_prompt_lists_catalog() {
        let prompt = build_prompt(&request(&["bench", "row"]));
        assert!(prompt.contains("Build strength"));
        assert!(prompt.contains("- bench: BENCH"));
        assert!(prompt.contains("45 minutes"));
        assert!(prompt.contains("barbell"));
    }

    #[tokio::test]
    async fn test_generate_calls_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&format!(
                "```json\n{}\n```",
                WORKOUT_JSON
            ))))
            .expect(1)
            .mount(&server)
            .await;

        let workout = generator(&server, Some("secret"))
            .generate(&request(&["bench", "row"]))
            .await
            .unwrap();
        assert_eq!(workout.exercises.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_drops_unknown_exercises() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(WORKOUT_JSON)))
            .mount(&server)
            .await;

        let gen = generator(&server, Some("secret"));
        let workout = gen.generate(&request(&["bench"])).await.unwrap();
        let ids: Vec<_> = workout.exercises.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["bench"]);

        let err = gen.generate(&request(&["deadlift"])).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_generate_upstream_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(query_param("key", "bad"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("key", "empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("key", "slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(gemini_reply(WORKOUT_JSON))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        for key in ["bad", "empty", "slow"] {
            let err = generator(&server, Some(key))
                .generate(&request(&[]))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Upstream(_)), "key {}", key);
        }
    }

    #[tokio::test]
    async fn test_unconfigured_generator_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gen = generator(&server, None);
        assert!(!gen.is_configured());
        let err = gen.generate(&request(&[])).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
