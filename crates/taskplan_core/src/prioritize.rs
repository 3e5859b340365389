//! Urgency ranking over open tasks.
//!
//! # Responsibility
//! - Order tasks by time-to-deadline scaled down by their list's weight.
//!
//! # Invariants
//! - `urgency = seconds_until_due / priority`; lower sorts first.
//! - Seconds keep microsecond precision, so a deadline missed by a fraction
//!   of a second already yields a negative key.
//! - Overdue tasks have negative `seconds_until_due`, so they sort ahead of
//!   everything due in the future.
//! - Sorting is stable: equal urgency keeps input order.
//! - The key is recomputed on every call and never persisted.

use crate::model::task::Task;
use chrono::{Duration, NaiveDateTime};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ranking failure. Each variant means the caller passed inconsistent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrioritizeError {
    /// A task references a list the lookup does not know.
    MissingList { task_id: i64, list_name: String },
    /// The lookup returned a zero weight for a list.
    InvalidPriority { list_name: String },
}

impl Display for PrioritizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingList { task_id, list_name } => {
                write!(f, "task {task_id} references unknown list `{list_name}`")
            }
            Self::InvalidPriority { list_name } => {
                write!(f, "list `{list_name}` has a zero priority weight")
            }
        }
    }
}

impl Error for PrioritizeError {}

/// One task with its computed ranking key.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTask {
    pub task: Task,
    /// Signed seconds from `now` to the deadline. Negative when overdue.
    pub seconds_until_due: f64,
    /// Ranking key. Lower is more urgent.
    pub urgency: f64,
}

/// Computes the ranking key for one task.
pub fn urgency_of(
    task: &Task,
    priority: u32,
    now: NaiveDateTime,
) -> Result<(f64, f64), PrioritizeError> {
    if priority == 0 {
        return Err(PrioritizeError::InvalidPriority {
            list_name: task.list_name.clone(),
        });
    }
    let seconds_until_due = signed_seconds(task.due_at() - now);
    Ok((seconds_until_due, seconds_until_due / f64::from(priority)))
}

fn signed_seconds(delta: Duration) -> f64 {
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        // Beyond ~292k years microseconds overflow; whole seconds suffice there.
        None => delta.num_seconds() as f64,
    }
}

/// Ranks tasks by urgency, most urgent first, keeping each key.
///
/// `priority_of` maps a list name to its weight.
pub fn rank<F>(
    tasks: Vec<Task>,
    priority_of: F,
    now: NaiveDateTime,
) -> Result<Vec<RankedTask>, PrioritizeError>
where
    F: Fn(&str) -> Option<u32>,
{
    let mut ranked = Vec::with_capacity(tasks.len());
    for task in tasks {
        let priority =
            priority_of(&task.list_name).ok_or_else(|| PrioritizeError::MissingList {
                task_id: task.id,
                list_name: task.list_name.clone(),
            })?;
        let (seconds_until_due, urgency) = urgency_of(&task, priority, now)?;
        ranked.push(RankedTask {
            task,
            seconds_until_due,
            urgency,
        });
    }

    // `sort_by` is stable, which the tie rule relies on.
    ranked.sort_by(|a, b| a.urgency.total_cmp(&b.urgency));
    debug!(
        "event=prioritize module=prioritize status=ok tasks={}",
        ranked.len()
    );
    Ok(ranked)
}

/// Orders tasks by urgency, most urgent first.
pub fn prioritize<F>(
    tasks: Vec<Task>,
    priority_of: F,
    now: NaiveDateTime,
) -> Result<Vec<Task>, PrioritizeError>
where
    F: Fn(&str) -> Option<u32>,
{
    Ok(rank(tasks, priority_of, now)?
        .into_iter()
        .map(|ranked| ranked.task)
        .collect())
}
