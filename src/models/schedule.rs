// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar entries committing a user to a template on a given day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A scheduled workout stored in Firestore.
///
/// Every entry has its own ID, so a log started from an entry that was later
/// unscheduled never attaches to a new entry on the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ScheduledEntry {
    /// Document ID (UUID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub template_id: String,
    /// Scheduled day
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    /// Workout log started from this entry, set once on first start
    #[serde(default)]
    pub workout_log_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledEntry {
    pub fn new(user_id: &str, template_id: &str, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            template_id: template_id.to_string(),
            date,
            completed: false,
            workout_log_id: None,
            created_at: now,
        }
    }
}

/// Claim on one calendar day for one user.
///
/// Written alongside its entry with a create-only insert keyed by
/// (user, date), and removed when the entry is unscheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    /// Document ID (see [`ScheduleSlot::document_id`])
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    /// Entry currently holding the day
    pub entry_id: String,
}

impl ScheduleSlot {
    pub fn for_entry(entry: &ScheduledEntry) -> Self {
        Self {
            id: Self::document_id(&entry.user_id, entry.date),
            user_id: entry.user_id.clone(),
            date: entry.date,
            entry_id: entry.id.clone(),
        }
    }

    /// `{user}_{YYYY-MM-DD}` with the user ID URL-encoded.
    pub fn document_id(user_id: &str, date: NaiveDate) -> String {
        format!("{}_{}", urlencoding::encode(user_id), date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id_is_per_user_and_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(ScheduleSlot::document_id("u1", date), "u1_2026-03-09");
        assert_eq!(
            ScheduleSlot::document_id("a/b c", date),
            "a%2Fb%20c_2026-03-09"
        );
    }

    #[test]
    fn test_entries_on_the_same_day_get_distinct_ids() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let first = ScheduledEntry::new("u1", "t1", date, Utc::now());
        let second = ScheduledEntry::new("u1", "t2", date, Utc::now());
        assert_ne!(first.id, second.id);
        assert_eq!(
            ScheduleSlot::for_entry(&first).id,
            ScheduleSlot::for_entry(&second).id
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let entry = ScheduledEntry::new("u1", "t1", date, Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["templateId"], "t1");
        assert_eq!(json["date"], "2026-03-09");
        assert_eq!(json["workoutLogId"], serde_json::Value::Null);
    }
}
