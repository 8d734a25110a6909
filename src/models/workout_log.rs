// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout logs: one concrete attempt at a template, with the exercises
//! and sets recorded while it was performed.
//!
//! Each level is its own collection. Document IDs are derived from the
//! parent, which gives the store a uniqueness constraint for free:
//! - `workout_logs/wl_{scheduledEntryId}`
//! - `logged_exercises/{workoutLogId}_{exerciseId}`
//! - `logged_sets/{loggedExerciseId}_s{setNumber}`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A workout session stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutLog {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    /// Scheduled entry this log was started from
    #[serde(default)]
    pub scheduled_workout_id: Option<String>,
    /// Display name (copied from the template)
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Duration in minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkoutLog {
    pub fn document_id_for_entry(scheduled_entry_id: &str) -> String {
        format!("wl_{}", scheduled_entry_id)
    }
}

/// One exercise begun within a workout log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoggedExercise {
    pub id: String,
    pub workout_log_id: String,
    pub exercise_id: String,
    /// Position within the session
    pub order: u32,
    /// Notes snapshotted when the exercise was started
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoggedExercise {
    pub fn document_id(workout_log_id: &str, exercise_id: &str) -> String {
        format!("{}_{}", workout_log_id, urlencoding::encode(exercise_id))
    }
}

/// One recorded set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoggedSet {
    pub id: String,
    pub logged_exercise_id: String,
    /// 1-based
    pub set_number: u32,
    pub reps: u32,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default = "default_true")]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl LoggedSet {
    pub fn document_id(logged_exercise_id: &str, set_number: u32) -> String {
        format!("{}_s{}", logged_exercise_id, set_number)
    }
}

/// A logged exercise together with its sets (ascending set number).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoggedExerciseDetail {
    #[serde(flatten)]
    pub exercise: LoggedExercise,
    pub sets: Vec<LoggedSet>,
}

impl LoggedExerciseDetail {
    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

/// A workout log together with its exercises (ascending order).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutLogDetail {
    #[serde(flatten)]
    pub log: WorkoutLog,
    pub exercises: Vec<LoggedExerciseDetail>,
}

impl WorkoutLogDetail {
    /// Find the logged exercise for a catalog exercise, if it was started.
    pub fn exercise(&self, exercise_id: &str) -> Option<&LoggedExerciseDetail> {
        self.exercises
            .iter()
            .find(|e| e.exercise.exercise_id == exercise_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_nest_under_parent() {
        let log_id = WorkoutLog::document_id_for_entry("u1_2026-03-09");
        assert_eq!(log_id, "wl_u1_2026-03-09");

        let exercise_id = LoggedExercise::document_id(&log_id, "barbell/squat");
        assert_eq!(exercise_id, "wl_u1_2026-03-09_barbell%2Fsquat");

        assert_eq!(
            LoggedSet::document_id(&exercise_id, 3),
            "wl_u1_2026-03-09_barbell%2Fsquat_s3"
        );
    }

    #[test]
    fn test_set_completed_defaults_true() {
        let set: LoggedSet = serde_json::from_value(serde_json::json!({
            "id": "x_s1",
            "loggedExerciseId": "x",
            "setNumber": 1,
            "reps": 8,
            "createdAt": "2026-03-09T10:00:00Z"
        }))
        .unwrap();
        assert!(set.completed);
        assert_eq!(set.weight, None);
    }
}
