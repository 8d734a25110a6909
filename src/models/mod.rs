// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod generated;
pub mod schedule;
pub mod template;
pub mod workout_log;

pub use generated::{GeneratedExercise, GeneratedWorkout};
pub use schedule::{ScheduleSlot, ScheduledEntry};
pub use template::{TemplateExerciseSpec, WorkoutTemplate};
pub use workout_log::{LoggedExercise, LoggedExerciseDetail, LoggedSet, WorkoutLog, WorkoutLogDetail};
