//! Storage abstraction and persistence implementations.
//!
//! # Responsibility
//! - Define the storage capability set shared by every backend.
//! - Isolate SQL and flat-file details from planner orchestration.
//!
//! # Invariants
//! - Every mutation that touches one record set is all-or-nothing. Flat-file
//!   list deletion spans two files and may stop after removing the tasks;
//!   it never leaves tasks on a missing list.
//! - Reopening a store reconstructs lists, tasks, and the next id from
//!   persisted records alone.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod file_store;
pub mod record;
pub mod sqlite_store;

use crate::db::DbError;
use crate::model::task::{NewTask, Task, TaskId, FIRST_TASK_ID};
use crate::model::task_list::TaskList;
use crate::model::ValidationError;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error shared by all backends.
#[derive(Debug)]
pub enum RepoError {
    /// SQLite transport or bootstrap failure.
    Db(DbError),
    /// Flat-file I/O failure.
    Io(std::io::Error),
    /// Record rejected before any write.
    Validation(ValidationError),
    /// No task with this id.
    NotFound(TaskId),
    /// Task is already marked completed.
    AlreadyCompleted(TaskId),
    /// No list with this name.
    UnknownList(String),
    /// A list with this name already exists.
    DuplicateList(String),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// The persisted max id is `TaskId::MAX`; no further id can be issued.
    IdSpaceExhausted,
}

impl RepoError {
    /// Returns whether the error comes from the storage medium itself
    /// rather than from the request.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Db(_) | Self::Io(_) | Self::InvalidData(_) | Self::IdSpaceExhausted
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "storage i/o failed: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::AlreadyCompleted(id) => write!(f, "task already completed: {id}"),
            Self::UnknownList(name) => write!(f, "list not found: {name}"),
            Self::DuplicateList(name) => write!(f, "list already exists: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::IdSpaceExhausted => write!(f, "task id space exhausted"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Include tasks already marked completed.
    pub include_completed: bool,
    /// Restrict to these list names. `None` or an empty set means all lists.
    pub lists: Option<BTreeSet<String>>,
}

impl TaskQuery {
    /// Open tasks only, optionally restricted to some lists.
    pub fn open(lists: Option<BTreeSet<String>>) -> Self {
        Self {
            include_completed: false,
            lists,
        }
    }

    /// Open and completed tasks, optionally restricted to some lists.
    pub fn all(lists: Option<BTreeSet<String>>) -> Self {
        Self {
            include_completed: true,
            lists,
        }
    }

    /// Effective list filter, treating an empty set as "no filter".
    pub fn list_filter(&self) -> Option<&BTreeSet<String>> {
        self.lists.as_ref().filter(|lists| !lists.is_empty())
    }

    /// In-memory form of the query, shared by backends that filter in Rust.
    pub fn matches(&self, task: &Task) -> bool {
        if !self.include_completed && task.completed {
            return false;
        }
        self.list_filter()
            .map_or(true, |lists| lists.contains(&task.list_name))
    }
}

/// Storage capability set for lists and tasks.
///
/// Implementations own their backing handle exclusively. Referential checks
/// that need the list registry (default-list protection, validation of user
/// input) live in the service layer; the store only guarantees that it never
/// persists a task whose list record is absent.
pub trait TaskStore {
    /// Loads every persisted list, including the default list.
    fn load_lists(&self) -> RepoResult<Vec<TaskList>>;
    /// Persists a new list. Fails with `DuplicateList` when the name exists.
    fn insert_list(&mut self, list: &TaskList) -> RepoResult<()>;
    /// Removes a list and every task on it. Returns how many tasks were removed.
    ///
    /// Tasks are removed before the list. A backend that cannot do both in one
    /// write may fail in between, leaving the list present and empty.
    fn delete_list(&mut self, name: &str) -> RepoResult<usize>;
    /// Removes every task (open or completed) on a list, keeping the list.
    fn cascade_delete_by_list(&mut self, name: &str) -> RepoResult<usize>;
    /// Persists a new open task under the next unused id.
    fn create_task(&mut self, task: &NewTask) -> RepoResult<Task>;
    /// Loads one task by id.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Removes one task. Fails with `NotFound` when absent.
    fn delete_task(&mut self, id: TaskId) -> RepoResult<()>;
    /// Marks one task completed. Fails with `NotFound` or `AlreadyCompleted`.
    fn complete_task(&mut self, id: TaskId) -> RepoResult<()>;
    /// Lists tasks matching the query, ordered by id.
    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>>;
    /// Id the next `create_task` call will assign.
    fn next_task_id(&self) -> RepoResult<TaskId>;
}

impl<S: TaskStore + ?Sized> TaskStore for Box<S> {
    fn load_lists(&self) -> RepoResult<Vec<TaskList>> {
        (**self).load_lists()
    }

    fn insert_list(&mut self, list: &TaskList) -> RepoResult<()> {
        (**self).insert_list(list)
    }

    fn delete_list(&mut self, name: &str) -> RepoResult<usize> {
        (**self).delete_list(name)
    }

    fn cascade_delete_by_list(&mut self, name: &str) -> RepoResult<usize> {
        (**self).cascade_delete_by_list(name)
    }

    fn create_task(&mut self, task: &NewTask) -> RepoResult<Task> {
        (**self).create_task(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn delete_task(&mut self, id: TaskId) -> RepoResult<()> {
        (**self).delete_task(id)
    }

    fn complete_task(&mut self, id: TaskId) -> RepoResult<()> {
        (**self).complete_task(id)
    }

    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        (**self).list_tasks(query)
    }

    fn next_task_id(&self) -> RepoResult<TaskId> {
        (**self).next_task_id()
    }
}

/// Derives the next task id from persisted records.
///
/// `max_persisted` is the largest id currently stored; `last_issued` is the
/// largest id this store instance has handed out, which keeps ids from being
/// reissued within a session after the highest-id task is deleted. Nothing
/// here is persisted: a fresh instance starts from records alone.
///
/// # Errors
/// - `IdSpaceExhausted` when the next id would overflow `TaskId`.
pub fn derive_next_id(
    max_persisted: Option<TaskId>,
    last_issued: Option<TaskId>,
) -> RepoResult<TaskId> {
    let after = |id: TaskId| id.checked_add(1).ok_or(RepoError::IdSpaceExhausted);
    let from_records = match max_persisted {
        Some(max) => after(max)?,
        None => FIRST_TASK_ID,
    };
    match last_issued {
        Some(issued) => Ok(from_records.max(after(issued)?)),
        None => Ok(from_records),
    }
}
