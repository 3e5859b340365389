//! Command parsing and argument validation.
//!
//! # Invariants
//! - Every argument is validated before a command value is produced, so a
//!   parse failure never reaches the store.
//! - Dates must be `MM/DD/YYYY` and real calendar dates; times must be
//!   24-hour `HH:MM`.

use super::CommandError;
use crate::model::task::{TaskId, DATE_FORMAT, TIME_FORMAT};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("valid time regex"));
static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid id regex"));

/// One parsed, validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a task. `list = None` means the default list.
    NewTask {
        description: String,
        due_date: NaiveDate,
        due_time: NaiveTime,
        list: Option<String>,
    },
    DeleteTasks(Vec<TaskId>),
    CompleteTasks(Vec<TaskId>),
    NewList {
        name: String,
        priority: i64,
    },
    DeleteList(String),
    /// Open tasks, optionally filtered by list names.
    ViewTasks(Option<BTreeSet<String>>),
    /// Open and completed tasks, optionally filtered by list names.
    ViewAllTasks(Option<BTreeSet<String>>),
    /// Open tasks ranked by urgency, optionally filtered by list names.
    Prioritize(Option<BTreeSet<String>>),
    ViewLists,
    Help,
    Exit,
}

/// Parses one tokenized line. Returns `Ok(None)` for an empty token list.
pub fn parse(tokens: &[String]) -> Result<Option<Command>, CommandError> {
    let Some((head, args)) = tokens.split_first() else {
        return Ok(None);
    };
    let name = head.to_lowercase();

    let command = match name.as_str() {
        "newtask" | "nt" => parse_new_task(args)?,
        "deltask" | "dt" => Command::DeleteTasks(parse_ids("deltask", args)?),
        "complete" | "c" => Command::CompleteTasks(parse_ids("complete", args)?),
        "newlist" | "nl" => {
            expect_arity("newlist", args, 2, 2)?;
            Command::NewList {
                name: args[0].clone(),
                priority: parse_priority(&args[1])?,
            }
        }
        "dellist" | "dl" => {
            expect_arity("dellist", args, 1, 1)?;
            Command::DeleteList(args[0].clone())
        }
        "viewtasks" | "vt" => Command::ViewTasks(list_filter(args)),
        "viewalltasks" | "vat" => Command::ViewAllTasks(list_filter(args)),
        "prioritize" | "p" => Command::Prioritize(list_filter(args)),
        "viewlists" | "vl" => {
            expect_arity("viewlists", args, 0, 0)?;
            Command::ViewLists
        }
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Exit,
        _ => return Err(CommandError::UnknownCommand(head.clone())),
    };

    Ok(Some(command))
}

/// Parses a `MM/DD/YYYY` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, CommandError> {
    if !DATE_RE.is_match(value) {
        return Err(CommandError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| CommandError::InvalidDate(value.to_string()))
}

/// Parses a 24-hour `HH:MM` time.
pub fn parse_time(value: &str) -> Result<NaiveTime, CommandError> {
    if !TIME_RE.is_match(value) {
        return Err(CommandError::InvalidTime(value.to_string()));
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| CommandError::InvalidTime(value.to_string()))
}

/// Parses a non-negative task id.
pub fn parse_id(value: &str) -> Result<TaskId, CommandError> {
    if !ID_RE.is_match(value) {
        return Err(CommandError::InvalidId(value.to_string()));
    }
    value
        .parse()
        .map_err(|_| CommandError::InvalidId(value.to_string()))
}

fn parse_new_task(args: &[String]) -> Result<Command, CommandError> {
    expect_arity("newtask", args, 3, 4)?;
    Ok(Command::NewTask {
        description: args[0].clone(),
        due_date: parse_date(&args[1])?,
        due_time: parse_time(&args[2])?,
        list: args.get(3).cloned(),
    })
}

fn parse_ids(command: &'static str, args: &[String]) -> Result<Vec<TaskId>, CommandError> {
    if args.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "id",
        });
    }
    let mut ids = Vec::with_capacity(args.len());
    for arg in args {
        let id = parse_id(arg)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn parse_priority(value: &str) -> Result<i64, CommandError> {
    value
        .parse::<i64>()
        .ok()
        .filter(|priority| *priority >= 1)
        .ok_or_else(|| CommandError::InvalidPriority(value.to_string()))
}

fn list_filter(args: &[String]) -> Option<BTreeSet<String>> {
    if args.is_empty() {
        None
    } else {
        Some(args.iter().cloned().collect())
    }
}

fn expect_arity(
    command: &'static str,
    args: &[String],
    min: usize,
    max: usize,
) -> Result<(), CommandError> {
    if args.len() < min {
        return Err(CommandError::MissingArgument {
            command,
            argument: missing_argument_name(command, args.len()),
        });
    }
    if args.len() > max {
        return Err(CommandError::UnexpectedArgument {
            command,
            token: args[max].clone(),
        });
    }
    Ok(())
}

fn missing_argument_name(command: &'static str, present: usize) -> &'static str {
    match (command, present) {
        ("newtask", 0) => "description",
        ("newtask", 1) => "date",
        ("newtask", _) => "time",
        ("newlist", 0) => "name",
        ("newlist", _) => "priority",
        ("dellist", _) => "name",
        _ => "argument",
    }
}
