// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plans produced by the AI generation API.

use super::template::TemplateExerciseSpec;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeneratedExercise {
    #[validate(length(min = 1, max = 200))]
    pub exercise_id: String,
    #[validate(range(min = 1, max = 50))]
    pub sets: u32,
    #[validate(range(min = 1, max = 1000))]
    pub reps: u32,
    /// Seconds
    #[serde(default)]
    #[validate(range(max = 3600))]
    pub rest_time: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeneratedWorkout {
    #[validate(length(min = 1, max = 100))]
    pub workout_name: String,
    #[serde(default)]
    pub workout_description: String,
    #[validate(nested)]
    pub exercises: Vec<GeneratedExercise>,
    /// Estimated minutes
    #[serde(default)]
    pub total_duration: u32,
}

impl GeneratedWorkout {
    /// Template exercise list in generated order.
    pub fn template_exercises(&self) -> Vec<TemplateExerciseSpec> {
        self.exercises
            .iter()
            .enumerate()
            .map(|(order, e)| TemplateExerciseSpec {
                exercise_id: e.exercise_id.clone(),
                order: order as u32,
                sets: e.sets,
                reps: e.reps,
                rest_time: e.rest_time,
                notes: e.notes.clone(),
            })
            .collect()
    }
}
