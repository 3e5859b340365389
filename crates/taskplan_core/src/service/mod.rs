//! Core use-case services.
//!
//! # Responsibility
//! - Enforce list/task referential integrity above the storage layer.
//! - Keep CLI and dispatcher code decoupled from storage details.
//!
//! # Invariants
//! - Service APIs never bypass the store's persistence contract.
//! - Services stay storage-agnostic (`TaskStore` only).

pub mod list_registry;
pub mod planner;
pub mod shared;

/// Coarse error classification for callers that only need to know whose
/// fault a failure was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input. Nothing was changed.
    Validation,
    /// Input names a task or list that does not exist, already exists, or is
    /// in the wrong state. Nothing was changed.
    Reference,
    /// The backing store failed. Already committed records are intact.
    Persistence,
}
