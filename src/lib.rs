// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gymlog: workout logging backend
//!
//! This crate provides the backend API for scheduling workouts, logging
//! sessions set by set, and generating workouts with an AI model behind a
//! per-user quota.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod services;
pub mod session_view;

use clock::SharedClock;
use config::Config;
use db::FirestoreDb;
use error::AppError;
use rate_limit::AiQuota;
use services::{ScheduleService, WorkoutGenerator, WorkoutLogService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub workout_logs: WorkoutLogService,
    pub schedule: ScheduleService,
    pub generator: WorkoutGenerator,
    pub ai_quota: AiQuota,
}

impl AppState {
    /// Wire services over `db`, all reading time from `clock`.
    pub fn new(config: Config, db: FirestoreDb, clock: SharedClock) -> Result<Self, AppError> {
        Ok(Self {
            workout_logs: WorkoutLogService::new(db.clone(), clock.clone()),
            schedule: ScheduleService::new(db.clone(), clock.clone()),
            generator: WorkoutGenerator::from_config(&config)?,
            ai_quota: AiQuota::from_config(&config, clock),
            config,
            db,
        })
    }
}
