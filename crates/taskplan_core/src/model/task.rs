//! Task model.
//!
//! # Responsibility
//! - Define the persisted task record and the creation request.
//! - Combine due date and time into one comparable instant.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes.
//! - `completed` only ever moves from `false` to `true`.
//! - `description` is non-blank and free of tab/line-break characters.

use super::{has_reserved_chars, ValidationError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Store-assigned task identifier. Strictly increasing within a store.
pub type TaskId = i64;

/// Id handed out by an empty store.
pub const FIRST_TASK_ID: TaskId = 0;

/// Textual date layout accepted from callers and used by the flat-file store.
pub const DATE_FORMAT: &str = "%m/%d/%Y";
/// Textual 24-hour time layout accepted from callers and used by the flat-file store.
pub const TIME_FORMAT: &str = "%H:%M";
/// Time layout used when a due time carries seconds.
pub const TIME_WITH_SECONDS_FORMAT: &str = "%H:%M:%S";

/// Persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub list_name: String,
    pub completed: bool,
}

impl Task {
    /// Local wall-clock instant the task is due.
    pub fn due_at(&self) -> NaiveDateTime {
        self.due_date.and_time(self.due_time)
    }

    /// Returns whether the task still counts as outstanding.
    pub fn is_open(&self) -> bool {
        !self.completed
    }
}

/// Task creation request. The store assigns `id` and `completed = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub list_name: String,
}

impl NewTask {
    /// Builds a creation request. Sub-second precision is dropped so the
    /// stored time and the returned record always agree.
    pub fn new(
        description: impl Into<String>,
        due_date: NaiveDate,
        due_time: NaiveTime,
        list_name: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            due_date,
            due_time: due_time.with_nanosecond(0).unwrap_or(due_time),
            list_name: list_name.into(),
        }
    }

    /// Checks field-level invariants. List existence is checked by the planner.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if has_reserved_chars(&self.description) {
            return Err(ValidationError::ReservedCharacter {
                field: "description",
            });
        }
        if has_reserved_chars(&self.list_name) {
            return Err(ValidationError::ReservedCharacter { field: "list name" });
        }
        Ok(())
    }

    /// Materializes the stored record for an assigned id.
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            description: self.description,
            due_date: self.due_date,
            due_time: self.due_time,
            list_name: self.list_name,
            completed: false,
        }
    }
}

/// Formats a due time as `HH:MM`, or `HH:MM:SS` when seconds are set.
pub fn format_due_time(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format(TIME_FORMAT).to_string()
    } else {
        time.format(TIME_WITH_SECONDS_FORMAT).to_string()
    }
}

/// Parses either layout written by [`format_due_time`].
pub fn parse_due_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, TIME_WITH_SECONDS_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::{format_due_time, parse_due_time, NewTask, ValidationError};
    use chrono::{NaiveDate, NaiveTime};

    fn sample(description: &str) -> NewTask {
        NewTask::new(
            description,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            "tasks",
        )
    }

    #[test]
    fn due_at_combines_date_and_time() {
        let task = sample("pay rent").into_task(4);
        assert_eq!(task.id, 4);
        assert!(task.is_open());
        assert_eq!(
            task.due_at().format("%Y-%m-%d %H:%M").to_string(),
            "2024-03-09 17:30"
        );
    }

    #[test]
    fn due_time_layout_keeps_seconds_only_when_set() {
        let whole = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        let precise = NaiveTime::from_hms_opt(9, 5, 40).unwrap();
        assert_eq!(format_due_time(whole), "09:05");
        assert_eq!(format_due_time(precise), "09:05:40");
        assert_eq!(parse_due_time("09:05"), Some(whole));
        assert_eq!(parse_due_time("09:05:40"), Some(precise));
        assert_eq!(parse_due_time("9h05"), None);
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let time = NaiveTime::from_hms_milli_opt(9, 5, 40, 250).unwrap();
        let task = NewTask::new("x", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), time, "tasks");
        assert_eq!(task.due_time, NaiveTime::from_hms_opt(9, 5, 40).unwrap());
    }

    #[test]
    fn blank_description_is_rejected() {
        assert_eq!(
            sample("  ").validate().unwrap_err(),
            ValidationError::EmptyDescription
        );
    }

    #[test]
    fn description_with_line_break_is_rejected() {
        let err = sample("line\nbreak").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::ReservedCharacter {
                field: "description"
            }
        );
    }
}
