// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Templates and calendar entries.

use crate::clock::SharedClock;
use crate::db::{Created, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::{ScheduledEntry, TemplateExerciseSpec, WorkoutTemplate};
use chrono::NaiveDate;
use validator::Validate;

#[derive(Clone)]
pub struct ScheduleService {
    db: FirestoreDb,
    clock: SharedClock,
}

impl ScheduleService {
    pub fn new(db: FirestoreDb, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    /// Store a new template under a generated ID.
    pub async fn create_template(
        &self,
        user_id: &str,
        name: String,
        description: Option<String>,
        exercises: Vec<TemplateExerciseSpec>,
    ) -> Result<WorkoutTemplate> {
        if exercises.is_empty() {
            return Err(AppError::BadRequest(
                "Template needs at least one exercise".to_string(),
            ));
        }

        let template = WorkoutTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name,
            description,
            exercises,
            created_at: self.clock.now(),
        };
        template.validate()?;

        match self.db.create_template(&template).await? {
            Created::New => {
                tracing::info!(user_id, template_id = %template.id, "Template created");
                Ok(template)
            }
            Created::AlreadyExists => Err(AppError::Conflict(format!(
                "Template {} already exists",
                template.id
            ))),
        }
    }

    pub async fn get_template(&self, template_id: &str, user_id: &str) -> Result<WorkoutTemplate> {
        let template = self
            .db
            .get_template(template_id)
            .await?
            .ok_or_else(|| AppError::not_found("Template", template_id))?;

        if template.user_id != user_id {
            return Err(AppError::forbidden("Template", template_id));
        }
        Ok(template)
    }

    /// Put a template on the calendar. One entry per user per day.
    pub async fn schedule_workout(
        &self,
        user_id: &str,
        template_id: &str,
        date: NaiveDate,
    ) -> Result<ScheduledEntry> {
        self.get_template(template_id, user_id).await?;

        let entry = ScheduledEntry::new(user_id, template_id, date, self.clock.now());
        match self.db.create_scheduled_entry(&entry).await? {
            Created::New => {
                tracing::info!(user_id, template_id, %date, "Workout scheduled");
                Ok(entry)
            }
            Created::AlreadyExists => Err(AppError::Conflict(format!(
                "A workout is already scheduled on {}",
                date
            ))),
        }
    }

    pub async fn unschedule(&self, entry_id: &str, user_id: &str) -> Result<()> {
        let entry = self
            .db
            .get_scheduled_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found("Scheduled workout", entry_id))?;

        if entry.user_id != user_id {
            return Err(AppError::forbidden("Scheduled workout", entry_id));
        }

        self.db.delete_scheduled_entry(&entry).await?;
        tracing::info!(user_id, entry_id, "Workout unscheduled");
        Ok(())
    }
}
