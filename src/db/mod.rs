// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, with an in-memory backend for tests).

pub mod firestore;
pub mod memory;

pub use firestore::{Created, FirestoreDb};
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const TEMPLATES: &str = "workout_templates";
    pub const SCHEDULED_WORKOUTS: &str = "scheduled_workouts";
    pub const SCHEDULE_SLOTS: &str = "schedule_slots";
    pub const WORKOUT_LOGS: &str = "workout_logs";
    pub const LOGGED_EXERCISES: &str = "logged_exercises";
    pub const LOGGED_SETS: &str = "logged_sets";
}
