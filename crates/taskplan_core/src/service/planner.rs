//! Planner facade over the list registry and task store.
//!
//! # Responsibility
//! - Own one store handle and the registry loaded from it.
//! - Validate list references before task creation.
//! - Produce ranked views from a consistent snapshot.
//!
//! # Invariants
//! - A task is only created on a list the registry knows at call time.
//! - Failed operations leave both the store and the registry unchanged.

use super::list_registry::{ListError, ListRegistry};
use super::ErrorKind;
use crate::model::task::{NewTask, Task, TaskId};
use crate::model::task_list::TaskList;
use crate::model::ValidationError;
use crate::prioritize::{rank, PrioritizeError, RankedTask};
use crate::repo::{RepoError, RepoResult, TaskQuery, TaskStore};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from task operations.
#[derive(Debug)]
pub enum TaskError {
    /// The task's list does not exist.
    InvalidList(String),
    /// No task with this id.
    UnknownTask(TaskId),
    /// Task is already completed; state unchanged.
    AlreadyCompleted(TaskId),
    /// Malformed task fields.
    Validation(ValidationError),
    /// Ranking was handed inconsistent list state.
    Prioritize(PrioritizeError),
    /// The shared planner lock was poisoned by a panicking holder.
    Unavailable,
    /// Store-level failure.
    Repo(RepoError),
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidList(_)
            | Self::UnknownTask(_)
            | Self::AlreadyCompleted(_)
            | Self::Prioritize(_) => ErrorKind::Reference,
            Self::Unavailable | Self::Repo(_) => ErrorKind::Persistence,
        }
    }
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidList(name) => write!(f, "list not found: {name}"),
            Self::UnknownTask(id) => write!(f, "task not found: {id}"),
            Self::AlreadyCompleted(id) => write!(f, "task already completed: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Prioritize(err) => write!(f, "{err}"),
            Self::Unavailable => write!(f, "planner is unavailable after an earlier panic"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Prioritize(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::UnknownTask(id),
            RepoError::AlreadyCompleted(id) => Self::AlreadyCompleted(id),
            RepoError::UnknownList(name) => Self::InvalidList(name),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for TaskError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PrioritizeError> for TaskError {
    fn from(value: PrioritizeError) -> Self {
        Self::Prioritize(value)
    }
}

/// Open tasks and list weights copied at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerSnapshot {
    pub tasks: Vec<Task>,
    pub weights: HashMap<String, u32>,
}

impl PlannerSnapshot {
    /// Ranks the captured tasks relative to `now`.
    pub fn rank(self, now: NaiveDateTime) -> Result<Vec<RankedTask>, PrioritizeError> {
        let weights = self.weights;
        rank(self.tasks, |name| weights.get(name).copied(), now)
    }
}

/// Single-owner planner over one task store.
pub struct Planner<S: TaskStore> {
    store: S,
    registry: ListRegistry,
}

impl<S: TaskStore> Planner<S> {
    /// Takes ownership of the store and loads the list registry from it.
    pub fn open(store: S) -> RepoResult<Self> {
        let registry = ListRegistry::load(&store)?;
        info!(
            "event=planner_open module=service status=ok lists={} next_id={}",
            registry.len(),
            store.next_task_id()?
        );
        Ok(Self { store, registry })
    }

    /// Releases the store handle.
    pub fn close(self) -> S {
        info!("event=planner_close module=service status=ok");
        self.store
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &ListRegistry {
        &self.registry
    }

    /// Lists ordered by name.
    pub fn lists(&self) -> Vec<TaskList> {
        self.registry.lists().cloned().collect()
    }

    pub fn create_list(&mut self, name: &str, priority: i64) -> Result<TaskList, ListError> {
        self.registry.create_list(&mut self.store, name, priority)
    }

    /// Deletes a list and its tasks. Returns how many tasks were removed.
    pub fn delete_list(&mut self, name: &str) -> Result<usize, ListError> {
        self.registry.delete_list(&mut self.store, name)
    }

    /// Creates an open task and returns its assigned id.
    ///
    /// # Errors
    /// - `Validation` for a blank description or reserved characters.
    /// - `InvalidList` when `list_name` is not a known list.
    pub fn create_task(
        &mut self,
        description: &str,
        due_date: NaiveDate,
        due_time: NaiveTime,
        list_name: &str,
    ) -> Result<TaskId, TaskError> {
        let new_task = NewTask::new(description.trim(), due_date, due_time, list_name);
        new_task.validate()?;
        if !self.registry.validate(list_name) {
            return Err(TaskError::InvalidList(list_name.to_string()));
        }

        let task = self.store.create_task(&new_task)?;
        info!(
            "event=task_create module=service status=ok task_id={} list={}",
            task.id, task.list_name
        );
        Ok(task.id)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<(), TaskError> {
        self.store.delete_task(id).map_err(|err| {
            warn!(
                "event=task_delete module=service status=error task_id={} error={}",
                id, err
            );
            TaskError::from(err)
        })?;
        info!(
            "event=task_delete module=service status=ok task_id={}",
            id
        );
        Ok(())
    }

    /// Marks a task completed. A second call returns `AlreadyCompleted`.
    pub fn complete_task(&mut self, id: TaskId) -> Result<(), TaskError> {
        self.store.complete_task(id).map_err(|err| {
            warn!(
                "event=task_complete module=service status=error task_id={} error={}",
                id, err
            );
            TaskError::from(err)
        })?;
        info!(
            "event=task_complete module=service status=ok task_id={}",
            id
        );
        Ok(())
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, TaskError> {
        Ok(self.store.get_task(id)?)
    }

    /// Open tasks, optionally restricted to some lists. Ordered by id.
    pub fn list_open(&self, lists: Option<BTreeSet<String>>) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list_tasks(&TaskQuery::open(lists))?)
    }

    /// Open and completed tasks, optionally restricted to some lists. Ordered by id.
    pub fn list_all(&self, lists: Option<BTreeSet<String>>) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list_tasks(&TaskQuery::all(lists))?)
    }

    /// Copies open tasks and list weights for ranking.
    pub fn snapshot(&self, lists: Option<BTreeSet<String>>) -> Result<PlannerSnapshot, TaskError> {
        Ok(PlannerSnapshot {
            tasks: self.list_open(lists)?,
            weights: self.registry.weights(),
        })
    }

    /// Open tasks ranked by urgency against the local clock.
    pub fn prioritized(
        &self,
        lists: Option<BTreeSet<String>>,
    ) -> Result<Vec<RankedTask>, TaskError> {
        self.prioritized_at(Local::now().naive_local(), lists)
    }

    /// Open tasks ranked by urgency relative to `now`.
    pub fn prioritized_at(
        &self,
        now: NaiveDateTime,
        lists: Option<BTreeSet<String>>,
    ) -> Result<Vec<RankedTask>, TaskError> {
        Ok(self.snapshot(lists)?.rank(now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{Planner, TaskError};
    use crate::repo::sqlite_store::SqliteTaskStore;
    use crate::service::ErrorKind;
    use chrono::{NaiveDate, NaiveTime};

    fn planner() -> Planner<SqliteTaskStore> {
        Planner::open(SqliteTaskStore::open_in_memory().unwrap()).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn time() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn create_task_on_unknown_list_is_rejected() {
        let mut planner = planner();
        let err = planner
            .create_task("draft memo", date(), time(), "nope")
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidList(ref name) if name == "nope"));
        assert_eq!(err.kind(), ErrorKind::Reference);
        assert!(planner.list_all(None).unwrap().is_empty());
    }

    #[test]
    fn blank_description_is_a_validation_error() {
        let mut planner = planner();
        let err = planner.create_task("   ", date(), time(), "tasks").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn description_is_trimmed() {
        let mut planner = planner();
        let id = planner
            .create_task("  read book ", date(), time(), "tasks")
            .unwrap();
        let task = planner.get_task(id).unwrap().unwrap();
        assert_eq!(task.description, "read book");
    }

    #[test]
    fn unknown_task_errors_map_from_store() {
        let mut planner = planner();
        assert!(matches!(
            planner.delete_task(42).unwrap_err(),
            TaskError::UnknownTask(42)
        ));
        assert!(matches!(
            planner.complete_task(42).unwrap_err(),
            TaskError::UnknownTask(42)
        ));
    }
}
