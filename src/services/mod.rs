// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod generator;
pub mod schedule;
pub mod workout_log;

pub use generator::{CatalogExercise, GenerationRequest, WorkoutGenerator};
pub use schedule::ScheduleService;
pub use workout_log::{StartedSession, WorkoutLogService};
