// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side view of a running workout.
//!
//! The server stores only what was logged. Which exercise comes next, which
//! set number to send and when the workout is over are derived here from the
//! template plan and the logged state, so a reload (which re-issues
//! StartSession and gets the logged state back) lands on the same step.
//!
//! [`SessionRunner`] drives a [`WorkoutLogService`] through a view, issuing
//! StartSession and CompleteSession at most once each.

use crate::clock::SharedClock;
use crate::error::AppError;
use crate::models::{
    LoggedExerciseDetail, LoggedSet, TemplateExerciseSpec, WorkoutLogDetail,
};
use crate::services::{StartedSession, WorkoutLogService};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Workout has not been started")]
    NotStarted,

    #[error("Workout start was already requested")]
    StartAlreadyRequested,

    #[error("No exercise left to start")]
    NoCurrentExercise,

    #[error("Exercise {0} must be started before logging sets")]
    ExerciseNotStarted(String),

    #[error("{0} exercise(s) still to do")]
    ExercisesRemaining(usize),

    #[error("Workout is already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Api(#[from] AppError),
}

/// What the client should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// Issue StartSession.
    Start,
    /// A request is in flight.
    Waiting,
    StartExercise {
        exercise_id: String,
        order: u32,
    },
    RecordSet {
        logged_exercise_id: String,
        set_number: u32,
        target_reps: u32,
    },
    /// Every planned exercise is done; issue CompleteSession.
    Complete { duration_minutes: u32 },
    Finished,
}

#[derive(Debug, Clone)]
pub struct SessionView {
    scheduled_workout_id: String,
    start_requested: bool,
    completion_submitted: bool,
    started_at: Option<DateTime<Utc>>,
    session: Option<WorkoutLogDetail>,
    template_exercises: Vec<TemplateExerciseSpec>,
}

impl SessionView {
    pub fn new(scheduled_workout_id: impl Into<String>) -> Self {
        Self {
            scheduled_workout_id: scheduled_workout_id.into(),
            start_requested: false,
            completion_submitted: false,
            started_at: None,
            session: None,
            template_exercises: Vec::new(),
        }
    }

    /// View over a StartSession response received at `received_at`.
    pub fn from_started(started: StartedSession, received_at: DateTime<Utc>) -> Self {
        let entry_id = started
            .workout_log
            .log
            .scheduled_workout_id
            .clone()
            .unwrap_or_default();
        let mut view = Self::new(entry_id);
        view.start_requested = true;
        view.apply_started(started, received_at);
        view
    }

    pub fn scheduled_workout_id(&self) -> &str {
        &self.scheduled_workout_id
    }

    pub fn session(&self) -> Option<&WorkoutLogDetail> {
        self.session.as_ref()
    }

    pub fn workout_log_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.log.id.as_str())
    }

    pub fn template_exercises(&self) -> &[TemplateExerciseSpec] {
        &self.template_exercises
    }

    pub fn is_completed(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.log.completed)
    }

    // ─── Guards ───────────────────────────────────────────────────

    /// Claim the single StartSession call for this view.
    pub fn begin_start(&mut self) -> Result<(), ViewError> {
        if self.start_requested {
            return Err(ViewError::StartAlreadyRequested);
        }
        self.start_requested = true;
        Ok(())
    }

    /// Release the claim after a failed StartSession so it can be retried.
    pub fn abort_start(&mut self) {
        if self.session.is_none() {
            self.start_requested = false;
        }
    }

    /// Claim the single CompleteSession call.
    pub fn begin_completion(&mut self) -> Result<(), ViewError> {
        if self.session.is_none() {
            return Err(ViewError::NotStarted);
        }
        if self.completion_submitted || self.is_completed() {
            return Err(ViewError::AlreadyCompleted);
        }
        let remaining = self.remaining_exercises();
        if remaining > 0 {
            return Err(ViewError::ExercisesRemaining(remaining));
        }
        self.completion_submitted = true;
        Ok(())
    }

    pub fn abort_completion(&mut self) {
        if !self.is_completed() {
            self.completion_submitted = false;
        }
    }

    // ─── Server responses ─────────────────────────────────────────

    pub fn apply_started(&mut self, started: StartedSession, received_at: DateTime<Utc>) {
        self.template_exercises = started.template_exercises;
        self.session = Some(started.workout_log);
        self.started_at = Some(received_at);
    }

    /// Insert or replace a logged exercise, keeping `order` ascending.
    pub fn apply_exercise(&mut self, detail: LoggedExerciseDetail) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session
            .exercises
            .iter_mut()
            .find(|e| e.exercise.id == detail.exercise.id)
        {
            Some(existing) => *existing = detail,
            None => {
                session.exercises.push(detail);
                session.exercises.sort_by_key(|e| e.exercise.order);
            }
        }
    }

    pub fn apply_set(&mut self, set: LoggedSet) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(exercise) = session
            .exercises
            .iter_mut()
            .find(|e| e.exercise.id == set.logged_exercise_id)
        else {
            return;
        };
        match exercise.sets.iter_mut().find(|s| s.id == set.id) {
            Some(existing) => *existing = set,
            None => {
                exercise.sets.push(set);
                exercise.sets.sort_by_key(|s| s.set_number);
            }
        }
    }

    pub fn apply_completed(&mut self, detail: WorkoutLogDetail) {
        self.completion_submitted = true;
        self.session = Some(detail);
    }

    // ─── Derived state ────────────────────────────────────────────

    pub fn logged(&self, exercise_id: &str) -> Option<&LoggedExerciseDetail> {
        self.session.as_ref()?.exercise(exercise_id)
    }

    fn is_done(&self, spec: &TemplateExerciseSpec) -> bool {
        self.logged(&spec.exercise_id)
            .is_some_and(|logged| logged.completed_sets() >= spec.sets as usize)
    }

    /// First planned exercise that is not started or still short of its
    /// target sets. `None` once every exercise is done.
    pub fn current_exercise_index(&self) -> Option<usize> {
        self.template_exercises
            .iter()
            .position(|spec| !self.is_done(spec))
    }

    pub fn current_exercise(&self) -> Option<&TemplateExerciseSpec> {
        self.current_exercise_index()
            .map(|i| &self.template_exercises[i])
    }

    pub fn remaining_exercises(&self) -> usize {
        self.template_exercises
            .iter()
            .filter(|spec| !self.is_done(spec))
            .count()
    }

    /// Whole minutes since the StartSession response, rounded.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let millis = (now - started_at).num_milliseconds().max(0);
        ((millis + 30_000) / 60_000) as u32
    }

    pub fn next_step(&self, now: DateTime<Utc>) -> NextStep {
        if self.is_completed() {
            return NextStep::Finished;
        }
        if self.session.is_none() {
            return if self.start_requested {
                NextStep::Waiting
            } else {
                NextStep::Start
            };
        }

        let Some(spec) = self.current_exercise() else {
            return if self.completion_submitted {
                NextStep::Waiting
            } else {
                NextStep::Complete {
                    duration_minutes: self.elapsed_minutes(now),
                }
            };
        };

        match self.logged(&spec.exercise_id) {
            None => NextStep::StartExercise {
                exercise_id: spec.exercise_id.clone(),
                order: spec.order,
            },
            Some(logged) => NextStep::RecordSet {
                logged_exercise_id: logged.exercise.id.clone(),
                set_number: logged.sets.len() as u32 + 1,
                target_reps: spec.reps,
            },
        }
    }
}

/// Runs one workout for one user against the service layer.
pub struct SessionRunner {
    service: WorkoutLogService,
    clock: SharedClock,
    user_id: String,
    view: SessionView,
}

impl SessionRunner {
    pub fn new(
        service: WorkoutLogService,
        clock: SharedClock,
        user_id: impl Into<String>,
        scheduled_workout_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            clock,
            user_id: user_id.into(),
            view: SessionView::new(scheduled_workout_id),
        }
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn next_step(&self) -> NextStep {
        self.view.next_step(self.clock.now())
    }

    pub async fn start(&mut self) -> Result<&SessionView, ViewError> {
        self.view.begin_start()?;

        let started = match self
            .service
            .start_session(&self.view.scheduled_workout_id, &self.user_id)
            .await
        {
            Ok(started) => started,
            Err(e) => {
                self.view.abort_start();
                return Err(e.into());
            }
        };

        self.view.apply_started(started, self.clock.now());
        Ok(&self.view)
    }

    /// Activate the exercise under the cursor.
    pub async fn start_current_exercise(&mut self) -> Result<&LoggedExerciseDetail, ViewError> {
        let log_id = self
            .view
            .workout_log_id()
            .ok_or(ViewError::NotStarted)?
            .to_string();
        let spec = self
            .view
            .current_exercise()
            .cloned()
            .ok_or(ViewError::NoCurrentExercise)?;

        let detail = self
            .service
            .start_exercise(
                &log_id,
                &spec.exercise_id,
                spec.order,
                spec.notes.clone(),
                &self.user_id,
            )
            .await?;
        self.view.apply_exercise(detail);

        self.view
            .logged(&spec.exercise_id)
            .ok_or(ViewError::ExerciseNotStarted(spec.exercise_id))
    }

    /// Record the next set of the current exercise.
    pub async fn record_set(&mut self, reps: u32, weight: Option<f64>) -> Result<LoggedSet, ViewError> {
        if self.view.session.is_none() {
            return Err(ViewError::NotStarted);
        }
        let spec = self
            .view
            .current_exercise()
            .ok_or(ViewError::NoCurrentExercise)?;
        let logged = self
            .view
            .logged(&spec.exercise_id)
            .ok_or_else(|| ViewError::ExerciseNotStarted(spec.exercise_id.clone()))?;

        let logged_exercise_id = logged.exercise.id.clone();
        let set_number = logged.sets.len() as u32 + 1;

        let set = self
            .service
            .record_set(&logged_exercise_id, set_number, reps, weight, &self.user_id)
            .await?;
        self.view.apply_set(set.clone());
        Ok(set)
    }

    /// Complete the workout with the elapsed time as its duration.
    pub async fn finish(&mut self, notes: Option<String>) -> Result<&WorkoutLogDetail, ViewError> {
        self.view.begin_completion()?;

        let log_id = self
            .view
            .workout_log_id()
            .ok_or(ViewError::NotStarted)?
            .to_string();
        let duration = self.view.elapsed_minutes(self.clock.now());

        let detail = match self
            .service
            .complete_session(&log_id, Some(duration), notes, &self.user_id)
            .await
        {
            Ok(detail) => detail,
            Err(e) => {
                self.view.abort_completion();
                return Err(e.into());
            }
        };

        self.view.apply_completed(detail);
        self.view.session().ok_or(ViewError::NotStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::db::FirestoreDb;
    use crate::models::{ScheduledEntry, WorkoutTemplate};
    use chrono::NaiveDate;
    use std::sync::Arc;

    const USER: &str = "u1";

    fn spec(exercise_id: &str, order: u32, sets: u32, reps: u32) -> TemplateExerciseSpec {
        TemplateExerciseSpec {
            exercise_id: exercise_id.to_string(),
            order,
            sets,
            reps,
            rest_time: 60,
            notes: None,
        }
    }

    async fn setup() -> (FirestoreDb, Arc<ManualClock>, WorkoutLogService, String) {
        let db = FirestoreDb::new_in_memory();
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_773_050_400, 0).unwrap(),
        ));

        db.create_template(&WorkoutTemplate {
            id: "T".to_string(),
            user_id: USER.to_string(),
            name: "Full body".to_string(),
            description: None,
            exercises: vec![spec("ex1", 0, 2, 10), spec("ex2", 1, 1, 12)],
            created_at: clock.now(),
        })
        .await
        .unwrap();

        let entry = ScheduledEntry::new(
            USER,
            "T",
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            clock.now(),
        );
        db.create_scheduled_entry(&entry).await.unwrap();

        let service = WorkoutLogService::new(db.clone(), clock.clone());
        (db, clock, service, entry.id)
    }

    #[tokio::test]
    async fn test_full_workout_through_runner() {
        let (db, clock, service, entry_id) = setup().await;
        let mut runner = SessionRunner::new(service, clock.clone(), USER, entry_id.clone());

        assert_eq!(runner.next_step(), NextStep::Start);
        let view = runner.start().await.unwrap();
        let planned: Vec<_> = view
            .template_exercises()
            .iter()
            .map(|e| e.exercise_id.as_str())
            .collect();
        assert_eq!(planned, vec!["ex1", "ex2"]);
        assert!(view.session().unwrap().exercises.is_empty());

        assert_eq!(
            runner.next_step(),
            NextStep::StartExercise {
                exercise_id: "ex1".to_string(),
                order: 0
            }
        );
        let le1 = runner.start_current_exercise().await.unwrap().exercise.id.clone();
        runner.record_set(10, Some(60.0)).await.unwrap();
        assert_eq!(
            runner.next_step(),
            NextStep::RecordSet {
                logged_exercise_id: le1.clone(),
                set_number: 2,
                target_reps: 10
            }
        );
        runner.record_set(9, Some(60.0)).await.unwrap();

        // ex1 is full; ex2 needs an explicit start.
        assert_eq!(runner.view().current_exercise_index(), Some(1));
        assert!(matches!(
            runner.record_set(12, None).await,
            Err(ViewError::ExerciseNotStarted(_))
        ));
        assert!(matches!(
            runner.finish(None).await,
            Err(ViewError::ExercisesRemaining(1))
        ));

        let le2 = runner.start_current_exercise().await.unwrap().exercise.id.clone();
        runner.record_set(12, None).await.unwrap();
        assert_eq!(runner.view().current_exercise_index(), None);

        clock.advance(chrono::Duration::minutes(42));
        assert_eq!(
            runner.next_step(),
            NextStep::Complete {
                duration_minutes: 42
            }
        );

        let done = runner.finish(None).await.unwrap();
        assert!(done.log.completed);
        assert_eq!(done.log.duration, Some(42));
        assert_eq!(runner.next_step(), NextStep::Finished);
        assert!(matches!(
            runner.finish(None).await,
            Err(ViewError::AlreadyCompleted)
        ));

        assert_eq!(db.list_logged_sets(&le1).await.unwrap().len(), 2);
        assert_eq!(db.list_logged_sets(&le2).await.unwrap().len(), 1);
        let entry = db.get_scheduled_entry(&entry_id).await.unwrap().unwrap();
        assert!(entry.completed);
    }

    #[tokio::test]
    async fn test_start_is_requested_once() {
        let (_db, clock, service, entry_id) = setup().await;
        let mut runner = SessionRunner::new(service, clock, USER, entry_id);

        runner.start().await.unwrap();
        assert!(matches!(
            runner.start().await,
            Err(ViewError::StartAlreadyRequested)
        ));
    }

    #[tokio::test]
    async fn test_failed_start_can_be_retried() {
        let (_db, clock, service, entry_id) = setup().await;
        let mut intruder = SessionRunner::new(service.clone(), clock.clone(), "u2", entry_id.clone());

        assert!(matches!(
            intruder.start().await,
            Err(ViewError::Api(AppError::Forbidden(_)))
        ));
        assert_eq!(intruder.next_step(), NextStep::Start);

        let mut owner = SessionRunner::new(service, clock, USER, entry_id);
        owner.start().await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_resumes_at_same_step() {
        let (_db, clock, service, entry_id) = setup().await;
        let mut first = SessionRunner::new(service.clone(), clock.clone(), USER, entry_id.clone());
        first.start().await.unwrap();
        first.start_current_exercise().await.unwrap();
        first.record_set(10, None).await.unwrap();
        let before = first.next_step();

        let mut reloaded = SessionRunner::new(service, clock, USER, entry_id);
        reloaded.start().await.unwrap();
        assert_eq!(reloaded.next_step(), before);
        assert!(matches!(before, NextStep::RecordSet { set_number: 2, .. }));
    }

    #[tokio::test]
    async fn test_uncompleted_set_keeps_cursor() {
        let (_db, clock, service, entry_id) = setup().await;
        let mut runner = SessionRunner::new(service.clone(), clock, USER, entry_id);
        runner.start().await.unwrap();
        runner.start_current_exercise().await.unwrap();
        runner.record_set(10, None).await.unwrap();
        let second = runner.record_set(4, None).await.unwrap();

        let corrected = service
            .update_set(&second.id, 4, None, Some(false), USER)
            .await
            .unwrap();
        let mut view = runner.view().clone();
        view.apply_set(corrected);

        // One completed set of two: still on ex1, and the next set is #3.
        assert_eq!(view.current_exercise_index(), Some(0));
        assert!(matches!(
            view.next_step(Utc::now()),
            NextStep::RecordSet { set_number: 3, .. }
        ));
    }

    #[test]
    fn test_elapsed_minutes_rounds() {
        let t0 = DateTime::from_timestamp(0, 0).unwrap();
        let mut view = SessionView::new("e");
        view.started_at = Some(t0);
        assert_eq!(view.elapsed_minutes(t0 + chrono::Duration::seconds(89)), 1);
        assert_eq!(view.elapsed_minutes(t0 + chrono::Duration::seconds(90)), 2);
        assert_eq!(view.elapsed_minutes(t0 - chrono::Duration::seconds(90)), 0);
    }

    #[test]
    fn test_empty_view_waits_for_start() {
        let mut view = SessionView::new("e");
        assert_eq!(view.next_step(Utc::now()), NextStep::Start);
        view.begin_start().unwrap();
        assert_eq!(view.next_step(Utc::now()), NextStep::Waiting);
        assert!(matches!(view.begin_completion(), Err(ViewError::NotStarted)));
    }
}
