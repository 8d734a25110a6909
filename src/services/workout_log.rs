// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session lifecycle.
//!
//! A session moves `NotStarted -> InProgress -> Completed`. Inside a running
//! session each exercise is activated once and then accumulates sets. Nothing
//! moves backwards: corrections to a set are in-place edits.
//!
//! Start calls are idempotent so a client can retry after a dropped response
//! or a page reload. Idempotency comes from create-only inserts on document
//! IDs derived from the parent, never from a read-then-write check.

use crate::clock::SharedClock;
use crate::db::{Created, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::{
    LoggedExercise, LoggedExerciseDetail, LoggedSet, ScheduledEntry, TemplateExerciseSpec,
    WorkoutLog, WorkoutLogDetail,
};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Result of starting (or resuming) a scheduled workout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StartedSession {
    /// What has been logged so far (empty for a fresh start)
    pub workout_log: WorkoutLogDetail,
    /// What is planned, in template order
    pub template_exercises: Vec<TemplateExerciseSpec>,
    /// True when an existing log was returned
    pub resumed: bool,
}

/// Drives workout logs for authenticated users.
#[derive(Clone)]
pub struct WorkoutLogService {
    db: FirestoreDb,
    clock: SharedClock,
}

impl WorkoutLogService {
    pub fn new(db: FirestoreDb, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    // ─── Ownership Checks ─────────────────────────────────────────

    async fn owned_entry(&self, entry_id: &str, user_id: &str) -> Result<ScheduledEntry> {
        let entry = self
            .db
            .get_scheduled_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found("Scheduled workout", entry_id))?;

        if entry.user_id != user_id {
            return Err(AppError::forbidden("Scheduled workout", entry_id));
        }
        Ok(entry)
    }

    async fn owned_log(&self, log_id: &str, user_id: &str) -> Result<WorkoutLog> {
        let log = self
            .db
            .get_workout_log(log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout log", log_id))?;

        if log.user_id != user_id {
            return Err(AppError::forbidden("Workout log", log_id));
        }
        Ok(log)
    }

    /// Ownership of a logged exercise is the ownership of its workout log.
    async fn owned_exercise(
        &self,
        logged_exercise_id: &str,
        user_id: &str,
    ) -> Result<(LoggedExercise, WorkoutLog)> {
        let exercise = self
            .db
            .get_logged_exercise(logged_exercise_id)
            .await?
            .ok_or_else(|| AppError::not_found("Logged exercise", logged_exercise_id))?;

        let log = self
            .db
            .get_workout_log(&exercise.workout_log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Logged exercise", logged_exercise_id))?;

        if log.user_id != user_id {
            return Err(AppError::forbidden("Logged exercise", logged_exercise_id));
        }
        Ok((exercise, log))
    }

    async fn owned_set(&self, set_id: &str, user_id: &str) -> Result<LoggedSet> {
        let set = self
            .db
            .get_logged_set(set_id)
            .await?
            .ok_or_else(|| AppError::not_found("Logged set", set_id))?;

        match self.owned_exercise(&set.logged_exercise_id, user_id).await {
            Ok(_) => Ok(set),
            Err(AppError::Forbidden(_)) => Err(AppError::forbidden("Logged set", set_id)),
            Err(AppError::NotFound(_)) => Err(AppError::not_found("Logged set", set_id)),
            Err(e) => Err(e),
        }
    }

    // ─── Transitions ──────────────────────────────────────────────

    /// Start the workout for a scheduled entry, or return the one already
    /// started from it.
    pub async fn start_session(&self, entry_id: &str, user_id: &str) -> Result<StartedSession> {
        let mut entry = self.owned_entry(entry_id, user_id).await?;

        let template = self
            .db
            .get_template(&entry.template_id)
            .await?
            .ok_or_else(|| AppError::not_found("Template", &entry.template_id))?;
        let template_exercises = template.ordered_exercises();

        if let Some(linked_id) = entry.workout_log_id.as_deref() {
            if let Some(log) = self.db.get_workout_log(linked_id).await? {
                tracing::debug!(user_id, entry_id, workout_log_id = %log.id, "Resuming workout");
                return Ok(StartedSession {
                    workout_log: self.db.workout_log_detail(log).await?,
                    template_exercises,
                    resumed: true,
                });
            }
            tracing::warn!(
                user_id,
                entry_id,
                workout_log_id = linked_id,
                "Scheduled entry links a missing workout log; starting a new one"
            );
        }

        let log = WorkoutLog {
            id: WorkoutLog::document_id_for_entry(&entry.id),
            user_id: user_id.to_string(),
            template_id: Some(template.id.clone()),
            scheduled_workout_id: Some(entry.id.clone()),
            name: template.name.clone(),
            date: entry.date,
            completed: false,
            completed_at: None,
            duration: None,
            notes: None,
            created_at: self.clock.now(),
        };

        let (workout_log, resumed) = match self.db.create_workout_log(&log).await? {
            Created::New => {
                tracing::info!(user_id, entry_id, workout_log_id = %log.id, "Workout started");
                (
                    WorkoutLogDetail {
                        log,
                        exercises: Vec::new(),
                    },
                    false,
                )
            }
            Created::AlreadyExists => {
                // Lost a race with a concurrent start: return the winner's log.
                let existing = self.db.get_workout_log(&log.id).await?.ok_or_else(|| {
                    AppError::Database(format!("Workout log {} missing after conflict", log.id))
                })?;
                tracing::debug!(user_id, entry_id, workout_log_id = %existing.id, "Concurrent start resolved");
                (self.db.workout_log_detail(existing).await?, true)
            }
        };

        if entry.workout_log_id.as_deref() != Some(workout_log.log.id.as_str()) {
            entry.workout_log_id = Some(workout_log.log.id.clone());
            if !self.db.set_entry_workout_log(&entry).await? {
                return Err(AppError::not_found("Scheduled workout", entry_id));
            }
        }

        Ok(StartedSession {
            workout_log,
            template_exercises,
            resumed,
        })
    }

    /// Activate an exercise within a session. Activating the same exercise
    /// again returns the existing record with its sets.
    pub async fn start_exercise(
        &self,
        workout_log_id: &str,
        exercise_id: &str,
        order: u32,
        notes: Option<String>,
        user_id: &str,
    ) -> Result<LoggedExerciseDetail> {
        let log = self.owned_log(workout_log_id, user_id).await?;
        let id = LoggedExercise::document_id(&log.id, exercise_id);

        if let Some(existing) = self.db.get_logged_exercise(&id).await? {
            return self.db.logged_exercise_detail(existing).await;
        }

        if log.completed {
            return Err(AppError::Conflict(format!(
                "Workout log {} is already completed",
                log.id
            )));
        }

        let exercise = LoggedExercise {
            id,
            workout_log_id: log.id.clone(),
            exercise_id: exercise_id.to_string(),
            order,
            notes,
            created_at: self.clock.now(),
        };

        match self.db.create_logged_exercise(&exercise).await? {
            Created::New => {
                tracing::info!(
                    user_id,
                    workout_log_id = %log.id,
                    exercise_id,
                    order,
                    "Exercise started"
                );
                Ok(LoggedExerciseDetail {
                    exercise,
                    sets: Vec::new(),
                })
            }
            Created::AlreadyExists => {
                let existing = self
                    .db
                    .get_logged_exercise(&exercise.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!(
                            "Logged exercise {} missing after conflict",
                            exercise.id
                        ))
                    })?;
                self.db.logged_exercise_detail(existing).await
            }
        }
    }

    /// Append the next set to a logged exercise.
    ///
    /// `set_number` must be one more than the number of sets already
    /// recorded; anything else (including a retried duplicate) is a conflict.
    pub async fn record_set(
        &self,
        logged_exercise_id: &str,
        set_number: u32,
        reps: u32,
        weight: Option<f64>,
        user_id: &str,
    ) -> Result<LoggedSet> {
        let (exercise, log) = self.owned_exercise(logged_exercise_id, user_id).await?;

        if log.completed {
            return Err(AppError::Conflict(format!(
                "Workout log {} is already completed",
                log.id
            )));
        }

        let recorded = self.db.list_logged_sets(&exercise.id).await?.len() as u32;
        let expected = recorded + 1;
        if set_number != expected {
            return Err(AppError::Conflict(format!(
                "Expected set number {}, got {}",
                expected, set_number
            )));
        }

        let set = LoggedSet {
            id: LoggedSet::document_id(&exercise.id, set_number),
            logged_exercise_id: exercise.id.clone(),
            set_number,
            reps,
            weight,
            completed: true,
            created_at: self.clock.now(),
            updated_at: None,
        };

        match self.db.create_logged_set(&set).await? {
            Created::New => {
                tracing::debug!(
                    user_id,
                    logged_exercise_id,
                    set_number,
                    reps,
                    weight = ?weight,
                    "Set recorded"
                );
                Ok(set)
            }
            Created::AlreadyExists => Err(AppError::Conflict(format!(
                "Set {} was already recorded",
                set_number
            ))),
        }
    }

    /// Correct a recorded set in place. `weight: None` keeps the stored
    /// weight; `completed` defaults to true.
    pub async fn update_set(
        &self,
        set_id: &str,
        reps: u32,
        weight: Option<f64>,
        completed: Option<bool>,
        user_id: &str,
    ) -> Result<LoggedSet> {
        let mut set = self.owned_set(set_id, user_id).await?;

        set.reps = reps;
        if weight.is_some() {
            set.weight = weight;
        }
        set.completed = completed.unwrap_or(true);
        set.updated_at = Some(self.clock.now());

        self.db.update_logged_set(&set).await?;
        tracing::debug!(user_id, set_id, reps, completed = set.completed, "Set updated");
        Ok(set)
    }

    /// Mark a session completed and, best-effort, its scheduled entry.
    ///
    /// Repeating the call is harmless: the flags are set again and any
    /// provided duration/notes overwrite the stored ones.
    pub async fn complete_session(
        &self,
        workout_log_id: &str,
        duration: Option<u32>,
        notes: Option<String>,
        user_id: &str,
    ) -> Result<WorkoutLogDetail> {
        let mut log = self.owned_log(workout_log_id, user_id).await?;

        if !log.completed || log.completed_at.is_none() {
            log.completed_at = Some(self.clock.now());
        }
        log.completed = true;
        if duration.is_some() {
            log.duration = duration;
        }
        if notes.is_some() {
            log.notes = notes;
        }

        self.db.update_workout_log(&log).await?;
        tracing::info!(
            user_id,
            workout_log_id,
            duration = ?log.duration,
            "Workout completed"
        );

        // The session is complete regardless of what happens to the calendar
        // entry; a stale entry flag is only logged.
        if let Some(entry_id) = log.scheduled_workout_id.as_deref() {
            if let Err(e) = self.mark_entry_completed(entry_id).await {
                tracing::warn!(
                    user_id,
                    workout_log_id,
                    entry_id,
                    error = %e,
                    "Workout completed but scheduled entry could not be marked complete"
                );
            }
        }

        self.db.workout_log_detail(log).await
    }

    async fn mark_entry_completed(&self, entry_id: &str) -> Result<()> {
        let mut entry = self
            .db
            .get_scheduled_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found("Scheduled workout", entry_id))?;

        if !entry.completed {
            entry.completed = true;
            if !self.db.set_entry_completed(&entry).await? {
                return Err(AppError::not_found("Scheduled workout", entry_id));
            }
        }
        Ok(())
    }

    /// Current state of a session, for resuming after a reload.
    pub async fn get_session(&self, workout_log_id: &str, user_id: &str) -> Result<WorkoutLogDetail> {
        let log = self.owned_log(workout_log_id, user_id).await?;
        self.db.workout_log_detail(log).await
    }
}
