//! Core domain logic for the task planner.
//! This crate is the single source of truth for list/task invariants and
//! the urgency ranking.

pub mod command;
pub mod db;
pub mod logging;
pub mod model;
pub mod prioritize;
pub mod repo;
pub mod service;

pub use command::{
    dispatch, dispatch_at, parse_line, tokenize, BatchAction, BatchItem, Command, CommandError,
    Outcome, HELP_TEXT,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{
    format_due_time, parse_due_time, NewTask, Task, TaskId, DATE_FORMAT, FIRST_TASK_ID,
    TIME_FORMAT,
};
pub use model::task_list::{TaskList, DEFAULT_LIST_NAME, DEFAULT_LIST_PRIORITY};
pub use model::ValidationError;
pub use prioritize::{prioritize, rank, PrioritizeError, RankedTask};
pub use repo::file_store::FileTaskStore;
pub use repo::sqlite_store::SqliteTaskStore;
pub use repo::{derive_next_id, RepoError, RepoResult, TaskQuery, TaskStore};
pub use service::list_registry::{ListError, ListRegistry};
pub use service::planner::{Planner, PlannerSnapshot, TaskError};
pub use service::shared::SharedPlanner;
pub use service::ErrorKind;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
