//! List registry service.
//!
//! # Responsibility
//! - Own the set of valid list names and their priority weights.
//! - Persist list creation/deletion through the task store.
//!
//! # Invariants
//! - The default list always exists and cannot be deleted.
//! - Deleting a list removes its tasks first, then the list record.
//! - In-memory state changes only after the store call succeeds.

use super::ErrorKind;
use crate::model::task_list::{TaskList, DEFAULT_LIST_NAME};
use crate::model::ValidationError;
use crate::repo::{RepoError, RepoResult, TaskStore};
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from list registry operations.
#[derive(Debug)]
pub enum ListError {
    /// List name is blank or contains reserved characters.
    InvalidName(ValidationError),
    /// Priority weight is below 1.
    InvalidPriority(i64),
    /// A list with this name already exists.
    DuplicateList(String),
    /// No list with this name.
    UnknownList(String),
    /// The default list cannot be deleted.
    ProtectedList(String),
    /// Store-level failure.
    Repo(RepoError),
}

impl ListError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) | Self::InvalidPriority(_) => ErrorKind::Validation,
            Self::DuplicateList(_) | Self::UnknownList(_) | Self::ProtectedList(_) => {
                ErrorKind::Reference
            }
            Self::Repo(_) => ErrorKind::Persistence,
        }
    }
}

impl Display for ListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::InvalidPriority(value) => {
                write!(f, "priority must be a positive integer, got {value}")
            }
            Self::DuplicateList(name) => write!(f, "list already exists: {name}"),
            Self::UnknownList(name) => write!(f, "list not found: {name}"),
            Self::ProtectedList(name) => write!(f, "list cannot be deleted: {name}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ListError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ListError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateList(name) => Self::DuplicateList(name),
            RepoError::UnknownList(name) => Self::UnknownList(name),
            RepoError::Validation(err) => Self::from(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ListError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::InvalidPriority(priority) => Self::InvalidPriority(priority),
            other => Self::InvalidName(other),
        }
    }
}

/// In-memory registry of lists, kept in sync with the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRegistry {
    lists: BTreeMap<String, TaskList>,
}

impl ListRegistry {
    /// Loads every list from the store.
    ///
    /// # Errors
    /// - `RepoError::InvalidData` when the store has no default list.
    pub fn load<S: TaskStore + ?Sized>(store: &S) -> RepoResult<Self> {
        let registry = Self::from_lists(store.load_lists()?);
        if !registry.validate(DEFAULT_LIST_NAME) {
            return Err(RepoError::InvalidData(format!(
                "default list `{DEFAULT_LIST_NAME}` is missing from the store"
            )));
        }
        Ok(registry)
    }

    /// Builds a registry from already persisted lists.
    pub fn from_lists(lists: impl IntoIterator<Item = TaskList>) -> Self {
        Self {
            lists: lists
                .into_iter()
                .map(|list| (list.name.clone(), list))
                .collect(),
        }
    }

    /// Name of the list that always exists.
    pub fn default_list_name() -> &'static str {
        DEFAULT_LIST_NAME
    }

    /// Membership check.
    pub fn validate(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TaskList> {
        self.lists.get(name)
    }

    pub fn priority_of(&self, name: &str) -> Option<u32> {
        self.lists.get(name).map(|list| list.priority)
    }

    /// Lists ordered by name.
    pub fn lists(&self) -> impl Iterator<Item = &TaskList> {
        self.lists.values()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Name → weight copy used for ranking outside a lock.
    pub fn weights(&self) -> HashMap<String, u32> {
        self.lists
            .values()
            .map(|list| (list.name.clone(), list.priority))
            .collect()
    }

    /// Creates and persists a list.
    ///
    /// # Errors
    /// - `InvalidName` / `InvalidPriority` for malformed input.
    /// - `DuplicateList` when the (trimmed) name exists.
    pub fn create_list<S: TaskStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
        priority: i64,
    ) -> Result<TaskList, ListError> {
        let list = TaskList::new(name, priority)?;
        if self.validate(&list.name) {
            return Err(ListError::DuplicateList(list.name));
        }

        store.insert_list(&list)?;
        self.lists.insert(list.name.clone(), list.clone());
        info!(
            "event=list_create module=service status=ok list={} priority={}",
            list.name, list.priority
        );
        Ok(list)
    }

    /// Deletes a list and every task on it. Returns how many tasks were removed.
    ///
    /// # Errors
    /// - `UnknownList` when absent.
    /// - `ProtectedList` for the default list.
    pub fn delete_list<S: TaskStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
    ) -> Result<usize, ListError> {
        if name == DEFAULT_LIST_NAME {
            return Err(ListError::ProtectedList(name.to_string()));
        }
        if !self.validate(name) {
            return Err(ListError::UnknownList(name.to_string()));
        }

        let removed = match store.delete_list(name) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(
                    "event=list_delete module=service status=error list={} error={}",
                    name, err
                );
                return Err(err.into());
            }
        };
        self.lists.remove(name);
        info!(
            "event=list_delete module=service status=ok list={} removed_tasks={}",
            name, removed
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ListError, ListRegistry};
    use crate::model::task_list::TaskList;
    use crate::repo::sqlite_store::SqliteTaskStore;
    use crate::service::ErrorKind;

    fn setup() -> (SqliteTaskStore, ListRegistry) {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let registry = ListRegistry::load(&store).unwrap();
        (store, registry)
    }

    #[test]
    fn loaded_registry_contains_default_list() {
        let (_store, registry) = setup();
        assert!(registry.validate(ListRegistry::default_list_name()));
        assert_eq!(registry.priority_of("tasks"), Some(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn create_list_rejects_duplicates_and_bad_weights() {
        let (mut store, mut registry) = setup();
        registry.create_list(&mut store, "work", 2).unwrap();

        let err = registry.create_list(&mut store, " work ", 5).unwrap_err();
        assert!(matches!(err, ListError::DuplicateList(ref name) if name == "work"));
        assert_eq!(err.kind(), ErrorKind::Reference);

        let err = registry.create_list(&mut store, "later", 0).unwrap_err();
        assert!(matches!(err, ListError::InvalidPriority(0)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!registry.validate("later"));
    }

    #[test]
    fn default_list_is_protected() {
        let (mut store, mut registry) = setup();
        let err = registry.delete_list(&mut store, "tasks").unwrap_err();
        assert!(matches!(err, ListError::ProtectedList(_)));
        assert!(registry.validate("tasks"));
    }

    #[test]
    fn delete_unknown_list_fails() {
        let (mut store, mut registry) = setup();
        let err = registry.delete_list(&mut store, "ghost").unwrap_err();
        assert!(matches!(err, ListError::UnknownList(_)));
    }

    #[test]
    fn registry_survives_reload_from_store() {
        let (mut store, mut registry) = setup();
        registry.create_list(&mut store, "work", 3).unwrap();

        let reloaded = ListRegistry::load(&store).unwrap();
        assert_eq!(reloaded, registry);
        assert_eq!(
            reloaded.get("work"),
            Some(&TaskList::new("work", 3).unwrap())
        );
    }
}
