//! Domain model for lists and tasks.
//!
//! # Responsibility
//! - Define the canonical records shared by storage backends and services.
//! - Keep field-level validation next to the types it protects.
//!
//! # Invariants
//! - Every task is identified by a store-assigned `TaskId`.
//! - List priority weights are always `>= 1`.

pub mod task;
pub mod task_list;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure for a list or task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// List name is blank after trim.
    EmptyListName,
    /// Task description is blank after trim.
    EmptyDescription,
    /// Field contains a tab or line break, which the flat-file layout reserves.
    ReservedCharacter { field: &'static str },
    /// Priority weight is below 1.
    InvalidPriority(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyListName => write!(f, "list name must not be blank"),
            Self::EmptyDescription => write!(f, "task description must not be blank"),
            Self::ReservedCharacter { field } => {
                write!(f, "{field} must not contain tabs or line breaks")
            }
            Self::InvalidPriority(value) => {
                write!(f, "priority must be a positive integer, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn has_reserved_chars(value: &str) -> bool {
    value.contains(['\t', '\n', '\r'])
}
