//! Prompt command layer.
//!
//! # Responsibility
//! - Turn a raw input line into a validated [`Command`].
//! - Run a command against a [`Planner`] and return a structured [`Outcome`].
//!
//! # Invariants
//! - Malformed input is rejected before any planner call.
//! - Outcomes carry data, not rendered text; presentation is the caller's job.

mod parse;
mod tokenize;

pub use parse::{parse, parse_date, parse_id, parse_time, Command};
pub use tokenize::tokenize;

use crate::model::task::{Task, TaskId};
use crate::model::task_list::TaskList;
use crate::prioritize::RankedTask;
use crate::repo::TaskStore;
use crate::service::list_registry::{ListError, ListRegistry};
use crate::service::planner::{Planner, TaskError};
use crate::service::ErrorKind;
use chrono::{Local, NaiveDateTime};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Usage summary for the prompt.
pub const HELP_TEXT: &str = "\
newtask|nt <description> <MM/DD/YYYY> <HH:MM> [list]  create a task
deltask|dt <id>...                                   delete tasks
complete|c <id>...                                   mark tasks completed
newlist|nl <name> <priority>                         create a list (priority >= 1)
dellist|dl <name>                                    delete a list and its tasks
viewtasks|vt [list...]                               show open tasks
viewalltasks|vat [list...]                           show all tasks
prioritize|p [list...]                               show open tasks by urgency
viewlists|vl                                         show lists
help|h|?                                             show this help
quit|exit|q                                          leave";

/// Errors from parsing or running a command.
#[derive(Debug)]
pub enum CommandError {
    UnknownCommand(String),
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    UnexpectedArgument {
        command: &'static str,
        token: String,
    },
    InvalidDate(String),
    InvalidTime(String),
    InvalidId(String),
    InvalidPriority(String),
    List(ListError),
    Task(TaskError),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::List(err) => err.kind(),
            Self::Task(err) => err.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(name) => write!(f, "unknown command `{name}`; try `help`"),
            Self::MissingArgument { command, argument } => {
                write!(f, "{command}: missing {argument}")
            }
            Self::UnexpectedArgument { command, token } => {
                write!(f, "{command}: unexpected argument `{token}`")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected MM/DD/YYYY"),
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
            Self::InvalidId(value) => write!(f, "invalid task id `{value}`"),
            Self::InvalidPriority(value) => {
                write!(f, "invalid priority `{value}`; expected a positive integer")
            }
            Self::List(err) => write!(f, "{err}"),
            Self::Task(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::List(err) => Some(err),
            Self::Task(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ListError> for CommandError {
    fn from(value: ListError) -> Self {
        Self::List(value)
    }
}

impl From<TaskError> for CommandError {
    fn from(value: TaskError) -> Self {
        Self::Task(value)
    }
}

/// Which per-id action a batch ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Delete,
    Complete,
}

/// Result of applying a batch action to one id.
#[derive(Debug)]
pub struct BatchItem {
    pub id: TaskId,
    pub result: Result<(), TaskError>,
}

/// Structured result of one dispatched command.
#[derive(Debug)]
pub enum Outcome {
    TaskCreated(TaskId),
    ListCreated(TaskList),
    ListDeleted { name: String, removed_tasks: usize },
    /// Per-id results. Ids after a persistence failure are not attempted.
    Batch {
        action: BatchAction,
        items: Vec<BatchItem>,
    },
    Tasks(Vec<Task>),
    Ranked(Vec<RankedTask>),
    Lists(Vec<TaskList>),
    Help(&'static str),
    Exit,
}

/// Parses a raw line. Returns `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    parse(&tokenize(line))
}

/// Runs a command, ranking against the local clock.
pub fn dispatch<S: TaskStore>(
    planner: &mut Planner<S>,
    command: Command,
) -> Result<Outcome, CommandError> {
    dispatch_at(planner, command, Local::now().naive_local())
}

/// Runs a command, ranking relative to `now`.
pub fn dispatch_at<S: TaskStore>(
    planner: &mut Planner<S>,
    command: Command,
    now: NaiveDateTime,
) -> Result<Outcome, CommandError> {
    debug!("event=dispatch module=command status=start command={}", command_name(&command));
    let outcome = match command {
        Command::NewTask {
            description,
            due_date,
            due_time,
            list,
        } => {
            let list = list.as_deref().unwrap_or(ListRegistry::default_list_name());
            Outcome::TaskCreated(planner.create_task(&description, due_date, due_time, list)?)
        }
        Command::DeleteTasks(ids) => Outcome::Batch {
            action: BatchAction::Delete,
            items: run_batch(ids, |id| planner.delete_task(id)),
        },
        Command::CompleteTasks(ids) => Outcome::Batch {
            action: BatchAction::Complete,
            items: run_batch(ids, |id| planner.complete_task(id)),
        },
        Command::NewList { name, priority } => {
            Outcome::ListCreated(planner.create_list(&name, priority)?)
        }
        Command::DeleteList(name) => {
            let removed_tasks = planner.delete_list(&name)?;
            Outcome::ListDeleted {
                name,
                removed_tasks,
            }
        }
        Command::ViewTasks(lists) => Outcome::Tasks(planner.list_open(lists)?),
        Command::ViewAllTasks(lists) => Outcome::Tasks(planner.list_all(lists)?),
        Command::Prioritize(lists) => Outcome::Ranked(planner.prioritized_at(now, lists)?),
        Command::ViewLists => Outcome::Lists(planner.lists()),
        Command::Help => Outcome::Help(HELP_TEXT),
        Command::Exit => Outcome::Exit,
    };
    Ok(outcome)
}

fn run_batch(
    ids: Vec<TaskId>,
    mut apply: impl FnMut(TaskId) -> Result<(), TaskError>,
) -> Vec<BatchItem> {
    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        let result = apply(id);
        let stop = matches!(&result, Err(err) if err.kind() == ErrorKind::Persistence);
        items.push(BatchItem { id, result });
        if stop {
            break;
        }
    }
    items
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::NewTask { .. } => "newtask",
        Command::DeleteTasks(_) => "deltask",
        Command::CompleteTasks(_) => "complete",
        Command::NewList { .. } => "newlist",
        Command::DeleteList(_) => "dellist",
        Command::ViewTasks(_) => "viewtasks",
        Command::ViewAllTasks(_) => "viewalltasks",
        Command::Prioritize(_) => "prioritize",
        Command::ViewLists => "viewlists",
        Command::Help => "help",
        Command::Exit => "exit",
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch_at, parse_line, BatchAction, CommandError, Outcome};
    use crate::repo::sqlite_store::SqliteTaskStore;
    use crate::service::planner::{Planner, TaskError};
    use crate::service::ErrorKind;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn run(planner: &mut Planner<SqliteTaskStore>, line: &str) -> Result<Outcome, CommandError> {
        let command = parse_line(line)?.expect("line should contain a command");
        dispatch_at(planner, command, now())
    }

    fn planner() -> Planner<SqliteTaskStore> {
        Planner::open(SqliteTaskStore::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn new_task_defaults_to_default_list() {
        let mut planner = planner();
        let outcome = run(&mut planner, r#"nt "sweep porch" 01/03/2025 10:00"#).unwrap();
        let id = match outcome {
            Outcome::TaskCreated(id) => id,
            other => panic!("unexpected outcome: {other:?}"),
        };
        let task = planner.get_task(id).unwrap().unwrap();
        assert_eq!(task.list_name, "tasks");
    }

    #[test]
    fn batch_complete_reports_each_id() {
        let mut planner = planner();
        run(&mut planner, "nt one 01/03/2025 10:00").unwrap();
        run(&mut planner, "c 0").unwrap();

        let (action, items) = match run(&mut planner, "c 0 7").unwrap() {
            Outcome::Batch { action, items } => (action, items),
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(action, BatchAction::Complete);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].result, Err(TaskError::AlreadyCompleted(0))));
        assert!(matches!(items[1].result, Err(TaskError::UnknownTask(7))));
    }

    #[test]
    fn prioritize_outcome_is_ranked() {
        let mut planner = planner();
        run(&mut planner, "nl work 2").unwrap();
        run(&mut planner, "nt far 01/02/2025 00:00 work").unwrap();
        run(&mut planner, "nt near 01/01/2025 12:00").unwrap();

        let ranked = match run(&mut planner, "p").unwrap() {
            Outcome::Ranked(ranked) => ranked,
            other => panic!("unexpected outcome: {other:?}"),
        };
        let descriptions: Vec<&str> = ranked
            .iter()
            .map(|item| item.task.description.as_str())
            .collect();
        // far: 86400s / 2 = 43200; near: 43200s / 1 = 43200 -> tie keeps id order.
        assert_eq!(descriptions, vec!["far", "near"]);
    }

    #[test]
    fn deleting_protected_list_is_a_reference_error() {
        let mut planner = planner();
        let err = run(&mut planner, "dl tasks").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn bad_date_is_a_validation_error_before_store() {
        let mut planner = planner();
        let err = run(&mut planner, "nt x 13/01/2025 10:00").unwrap_err();
        assert!(matches!(err, CommandError::InvalidDate(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(planner.list_all(None).unwrap().is_empty());
    }
}
