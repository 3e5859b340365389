//! Task list model.
//!
//! # Invariants
//! - `name` is non-blank, trimmed, and free of tab/line-break characters.
//! - `priority >= 1`, so dividing by it never fails or flips sign.

use super::{has_reserved_chars, ValidationError};
use serde::{Deserialize, Serialize};

/// Name of the list that always exists and cannot be deleted.
pub const DEFAULT_LIST_NAME: &str = "tasks";
/// Priority weight of the default list.
pub const DEFAULT_LIST_PRIORITY: u32 = 1;

/// Named group of tasks with a priority weight.
///
/// Higher weights pull deadlines forward in the prioritized view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskList {
    pub name: String,
    pub priority: u32,
}

impl TaskList {
    /// Builds a validated list record.
    ///
    /// The name is trimmed; a signed weight is accepted so callers can pass
    /// user input through without a lossy cast before validation.
    pub fn new(name: impl AsRef<str>, priority: i64) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyListName);
        }
        if has_reserved_chars(name) {
            return Err(ValidationError::ReservedCharacter { field: "list name" });
        }
        let priority = u32::try_from(priority)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or(ValidationError::InvalidPriority(priority))?;

        Ok(Self {
            name: name.to_string(),
            priority,
        })
    }

    /// The built-in default list.
    pub fn default_list() -> Self {
        Self {
            name: DEFAULT_LIST_NAME.to_string(),
            priority: DEFAULT_LIST_PRIORITY,
        }
    }

    /// Returns whether this is the protected default list.
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_LIST_NAME
    }

    /// Re-checks invariants on a record that did not come through [`TaskList::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        Self::new(&self.name, i64::from(self.priority)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskList, ValidationError, DEFAULT_LIST_NAME};

    #[test]
    fn new_trims_name_and_keeps_priority() {
        let list = TaskList::new("  work ", 3).unwrap();
        assert_eq!(list.name, "work");
        assert_eq!(list.priority, 3);
    }

    #[test]
    fn zero_and_negative_priorities_are_rejected() {
        assert_eq!(
            TaskList::new("work", 0).unwrap_err(),
            ValidationError::InvalidPriority(0)
        );
        assert_eq!(
            TaskList::new("work", -4).unwrap_err(),
            ValidationError::InvalidPriority(-4)
        );
    }

    #[test]
    fn priority_above_u32_range_is_rejected() {
        let err = TaskList::new("work", i64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPriority(_)));
    }

    #[test]
    fn names_with_tabs_are_rejected() {
        let err = TaskList::new("a\tb", 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ReservedCharacter { field: "list name" }
        );
        assert_eq!(
            TaskList::new("   ", 1).unwrap_err(),
            ValidationError::EmptyListName
        );
    }

    #[test]
    fn default_list_is_flagged() {
        let list = TaskList::default_list();
        assert_eq!(list.name, DEFAULT_LIST_NAME);
        assert!(list.is_default());
        assert!(list.validate().is_ok());
    }
}
