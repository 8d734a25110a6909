// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Templates and scheduled entries
//! - Workout logs, logged exercises and logged sets
//!
//! Uniqueness invariants are enforced with create-only inserts on derived
//! document IDs: Firestore rejects an insert whose document already exists,
//! and the in-memory backend performs the same check under a shard lock.

use crate::db::collections;
use crate::db::memory::MemoryStore;
use crate::error::AppError;
use crate::models::{
    LoggedExercise, LoggedExerciseDetail, LoggedSet, ScheduleSlot, ScheduledEntry, WorkoutLog,
    WorkoutLogDetail, WorkoutTemplate,
};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Outcome of a create-only insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Created {
    /// The document was written by this call.
    New,
    /// A document with this ID already existed; nothing was written.
    AlreadyExists,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

fn db_error(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore Emulator");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a client backed by an in-process store (tests, local runs).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    /// Access the in-process store, if this client uses one.
    pub fn memory_store(&self) -> Option<&MemoryStore> {
        match &self.backend {
            Backend::Memory(store) => Some(store.as_ref()),
            Backend::Firestore(_) => None,
        }
    }

    // ─── Document Primitives ──────────────────────────────────────

    async fn get_doc<T>(&self, collection: &'static str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(db_error),
            Backend::Memory(store) => store
                .get(collection, id)
                .map(serde_json::from_value)
                .transpose()
                .map_err(db_error),
        }
    }

    /// Create or overwrite a document.
    async fn set_doc<T>(&self, collection: &'static str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: T = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(db_error)?;
            }
            Backend::Memory(store) => {
                store.set(collection, id, serde_json::to_value(doc).map_err(db_error)?);
            }
        }
        Ok(())
    }

    /// Write a document only if its ID is unused.
    async fn create_doc<T>(
        &self,
        collection: &'static str,
        id: &str,
        doc: &T,
    ) -> Result<Created, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let result: firestore::FirestoreResult<T> = client
                    .fluent()
                    .insert()
                    .into(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await;

                match result {
                    Ok(_) => Ok(Created::New),
                    Err(FirestoreError::DataConflictError(_)) => {
                        Ok(Created::AlreadyExists)
                    }
                    Err(e) => Err(db_error(e)),
                }
            }
            Backend::Memory(store) => {
                let value = serde_json::to_value(doc).map_err(db_error)?;
                if store.create(collection, id, value) {
                    Ok(Created::New)
                } else {
                    Ok(Created::AlreadyExists)
                }
            }
        }
    }

    /// Write only `fields` of `doc` onto an existing document. Returns
    /// `false` when the document does not exist; nothing is written then.
    async fn update_doc_fields<T>(
        &self,
        collection: &'static str,
        id: &str,
        doc: &T,
        fields: &[&str],
    ) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let result: firestore::FirestoreResult<T> = client
                    .fluent()
                    .update()
                    .fields(fields)
                    .in_col(collection)
                    .precondition(FirestoreWritePrecondition::Exists(true))
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await;

                match result {
                    Ok(_) => Ok(true),
                    Err(FirestoreError::DataNotFoundError(_)) => Ok(false),
                    Err(e) => Err(db_error(e)),
                }
            }
            Backend::Memory(store) => {
                let value = serde_json::to_value(doc).map_err(db_error)?;
                Ok(store.update_fields(collection, id, &value, fields))
            }
        }
    }

    async fn delete_doc(&self, collection: &'static str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(db_error)?;
            }
            Backend::Memory(store) => {
                store.delete(collection, id);
            }
        }
        Ok(())
    }

    /// All documents whose `field` equals `value`, ascending by `order_by`.
    async fn query_children<T>(
        &self,
        collection: &'static str,
        field: &'static str,
        value: &str,
        order_by: &'static str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let value = value.to_string();
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
                    .order_by([(order_by, firestore::FirestoreQueryDirection::Ascending)])
                    .obj()
                    .query()
                    .await
                    .map_err(db_error)
            }
            Backend::Memory(store) => store
                .query_eq(collection, field, value, order_by)
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()
                .map_err(db_error),
        }
    }

    // ─── Template Operations ──────────────────────────────────────

    pub async fn get_template(&self, id: &str) -> Result<Option<WorkoutTemplate>, AppError> {
        self.get_doc(collections::TEMPLATES, id).await
    }

    pub async fn create_template(&self, template: &WorkoutTemplate) -> Result<Created, AppError> {
        self.create_doc(collections::TEMPLATES, &template.id, template)
            .await
    }

    // ─── Scheduled Entry Operations ───────────────────────────────

    pub async fn get_scheduled_entry(&self, id: &str) -> Result<Option<ScheduledEntry>, AppError> {
        self.get_doc(collections::SCHEDULED_WORKOUTS, id).await
    }

    /// Create an entry together with the slot that claims its day.
    ///
    /// Returns [`Created::AlreadyExists`] when the user already has an entry
    /// on that date; neither document is written then.
    pub async fn create_scheduled_entry(&self, entry: &ScheduledEntry) -> Result<Created, AppError> {
        let slot = ScheduleSlot::for_entry(entry);

        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                client
                    .fluent()
                    .update()
                    .in_col(collections::SCHEDULE_SLOTS)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&slot.id)
                    .object(&slot)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add slot to transaction: {}", e))
                    })?;

                client
                    .fluent()
                    .update()
                    .in_col(collections::SCHEDULED_WORKOUTS)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&entry.id)
                    .object(entry)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add entry to transaction: {}", e))
                    })?;

                match transaction.commit().await {
                    Ok(_) => Ok(Created::New),
                    Err(FirestoreError::DataConflictError(_)) => Ok(Created::AlreadyExists),
                    Err(e) => Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    ))),
                }
            }
            Backend::Memory(store) => {
                let slot_value = serde_json::to_value(&slot).map_err(db_error)?;
                if !store.create(collections::SCHEDULE_SLOTS, &slot.id, slot_value) {
                    return Ok(Created::AlreadyExists);
                }
                let entry_value = serde_json::to_value(entry).map_err(db_error)?;
                if !store.create(collections::SCHEDULED_WORKOUTS, &entry.id, entry_value) {
                    store.delete(collections::SCHEDULE_SLOTS, &slot.id);
                    return Ok(Created::AlreadyExists);
                }
                Ok(Created::New)
            }
        }
    }

    pub async fn get_schedule_slot(
        &self,
        user_id: &str,
        date: chrono::NaiveDate,
    ) -> Result<Option<ScheduleSlot>, AppError> {
        self.get_doc(collections::SCHEDULE_SLOTS, &ScheduleSlot::document_id(user_id, date))
            .await
    }

    /// Record the workout log started from `entry`. Only `workoutLogId` is
    /// written. Returns `false` if the entry no longer exists.
    pub async fn set_entry_workout_log(&self, entry: &ScheduledEntry) -> Result<bool, AppError> {
        self.update_doc_fields(
            collections::SCHEDULED_WORKOUTS,
            &entry.id,
            entry,
            &["workoutLogId"],
        )
        .await
    }

    /// Write `entry.completed` alone. Returns `false` if the entry no longer
    /// exists.
    pub async fn set_entry_completed(&self, entry: &ScheduledEntry) -> Result<bool, AppError> {
        self.update_doc_fields(
            collections::SCHEDULED_WORKOUTS,
            &entry.id,
            entry,
            &["completed"],
        )
        .await
    }

    /// Delete an entry and release its day.
    ///
    /// The slot is only removed while it still points at this entry.
    pub async fn delete_scheduled_entry(&self, entry: &ScheduledEntry) -> Result<(), AppError> {
        let slot_id = ScheduleSlot::document_id(&entry.user_id, entry.date);
        let holds_slot = self
            .get_schedule_slot(&entry.user_id, entry.date)
            .await?
            .is_some_and(|slot| slot.entry_id == entry.id);

        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                client
                    .fluent()
                    .delete()
                    .from(collections::SCHEDULED_WORKOUTS)
                    .document_id(&entry.id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add entry delete to transaction: {}", e))
                    })?;

                if holds_slot {
                    client
                        .fluent()
                        .delete()
                        .from(collections::SCHEDULE_SLOTS)
                        .document_id(&slot_id)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add slot delete to transaction: {}",
                                e
                            ))
                        })?;
                }

                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
            }
            Backend::Memory(store) => {
                store.delete(collections::SCHEDULED_WORKOUTS, &entry.id);
                if holds_slot {
                    store.delete(collections::SCHEDULE_SLOTS, &slot_id);
                }
            }
        }
        Ok(())
    }

    // ─── Workout Log Operations ───────────────────────────────────

    pub async fn get_workout_log(&self, id: &str) -> Result<Option<WorkoutLog>, AppError> {
        self.get_doc(collections::WORKOUT_LOGS, id).await
    }

    pub async fn create_workout_log(&self, log: &WorkoutLog) -> Result<Created, AppError> {
        self.create_doc(collections::WORKOUT_LOGS, &log.id, log).await
    }

    pub async fn update_workout_log(&self, log: &WorkoutLog) -> Result<(), AppError> {
        self.set_doc(collections::WORKOUT_LOGS, &log.id, log).await
    }

    // ─── Logged Exercise Operations ───────────────────────────────

    pub async fn get_logged_exercise(&self, id: &str) -> Result<Option<LoggedExercise>, AppError> {
        self.get_doc(collections::LOGGED_EXERCISES, id).await
    }

    pub async fn create_logged_exercise(
        &self,
        exercise: &LoggedExercise,
    ) -> Result<Created, AppError> {
        self.create_doc(collections::LOGGED_EXERCISES, &exercise.id, exercise)
            .await
    }

    /// Exercises of a workout log in ascending `order`.
    pub async fn list_logged_exercises(
        &self,
        workout_log_id: &str,
    ) -> Result<Vec<LoggedExercise>, AppError> {
        self.query_children(
            collections::LOGGED_EXERCISES,
            "workoutLogId",
            workout_log_id,
            "order",
        )
        .await
    }

    // ─── Logged Set Operations ────────────────────────────────────

    pub async fn get_logged_set(&self, id: &str) -> Result<Option<LoggedSet>, AppError> {
        self.get_doc(collections::LOGGED_SETS, id).await
    }

    pub async fn create_logged_set(&self, set: &LoggedSet) -> Result<Created, AppError> {
        self.create_doc(collections::LOGGED_SETS, &set.id, set).await
    }

    pub async fn update_logged_set(&self, set: &LoggedSet) -> Result<(), AppError> {
        self.set_doc(collections::LOGGED_SETS, &set.id, set).await
    }

    /// Sets of a logged exercise in ascending `setNumber`.
    pub async fn list_logged_sets(
        &self,
        logged_exercise_id: &str,
    ) -> Result<Vec<LoggedSet>, AppError> {
        self.query_children(
            collections::LOGGED_SETS,
            "loggedExerciseId",
            logged_exercise_id,
            "setNumber",
        )
        .await
    }

    // ─── Aggregate Reads ──────────────────────────────────────────

    /// Load a logged exercise's sets.
    pub async fn logged_exercise_detail(
        &self,
        exercise: LoggedExercise,
    ) -> Result<LoggedExerciseDetail, AppError> {
        let sets = self.list_logged_sets(&exercise.id).await?;
        Ok(LoggedExerciseDetail { exercise, sets })
    }

    /// Load a workout log with all exercises and sets.
    ///
    /// Set queries run concurrently, bounded to avoid overloading Firestore.
    pub async fn workout_log_detail(&self, log: WorkoutLog) -> Result<WorkoutLogDetail, AppError> {
        let exercises = self.list_logged_exercises(&log.id).await?;

        let exercises = stream::iter(exercises)
            .map(|exercise| self.logged_exercise_detail(exercise))
            .buffered(MAX_CONCURRENT_DB_OPS)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(WorkoutLogDetail { log, exercises })
    }
}
