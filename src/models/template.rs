// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout templates: reusable, ordered exercise plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// One planned exercise within a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TemplateExerciseSpec {
    /// Exercise catalog reference
    #[validate(length(min = 1, max = 200))]
    pub exercise_id: String,
    /// Position within the template (ascending)
    pub order: u32,
    /// Target number of sets
    #[validate(range(min = 1, max = 50))]
    pub sets: u32,
    /// Target reps per set
    #[validate(range(min = 1, max = 1000))]
    pub reps: u32,
    /// Rest between sets, in seconds
    #[serde(default)]
    #[validate(range(max = 3600))]
    pub rest_time: u32,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// A workout template stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutTemplate {
    pub id: String,
    pub user_id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50), nested)]
    pub exercises: Vec<TemplateExerciseSpec>,
    pub created_at: DateTime<Utc>,
}

impl WorkoutTemplate {
    /// Exercises sorted by `order`, ties kept in stored order.
    pub fn ordered_exercises(&self) -> Vec<TemplateExerciseSpec> {
        let mut exercises = self.exercises.clone();
        exercises.sort_by_key(|e| e.order);
        exercises
    }
}
