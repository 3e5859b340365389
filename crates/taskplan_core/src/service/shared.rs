//! Shared planner handle for callers on more than one thread.
//!
//! # Invariants
//! - Every operation runs inside one exclusive critical section per planner.
//! - Ranking copies open tasks and weights under the lock and sorts after
//!   releasing it, so it never observes a partially applied mutation.

use super::planner::{Planner, TaskError};
use crate::prioritize::RankedTask;
use crate::repo::TaskStore;
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable, thread-safe planner handle.
pub struct SharedPlanner<S: TaskStore> {
    inner: Arc<Mutex<Planner<S>>>,
}

impl<S: TaskStore> Clone for SharedPlanner<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TaskStore> SharedPlanner<S> {
    pub fn new(planner: Planner<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(planner)),
        }
    }

    /// Runs `f` with exclusive access to the planner.
    ///
    /// # Errors
    /// - `TaskError::Unavailable` when an earlier holder panicked.
    pub fn with<T>(&self, f: impl FnOnce(&mut Planner<S>) -> T) -> Result<T, TaskError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    /// Open tasks ranked against the local clock.
    pub fn prioritized(
        &self,
        lists: Option<BTreeSet<String>>,
    ) -> Result<Vec<RankedTask>, TaskError> {
        self.prioritized_at(Local::now().naive_local(), lists)
    }

    /// Open tasks ranked relative to `now`.
    pub fn prioritized_at(
        &self,
        now: NaiveDateTime,
        lists: Option<BTreeSet<String>>,
    ) -> Result<Vec<RankedTask>, TaskError> {
        let snapshot = self.lock()?.snapshot(lists)?;
        Ok(snapshot.rank(now)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Planner<S>>, TaskError> {
        self.inner.lock().map_err(|_| TaskError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::SharedPlanner;
    use crate::repo::sqlite_store::SqliteTaskStore;
    use crate::service::planner::{Planner, TaskError};
    use chrono::{NaiveDate, NaiveTime};
    use std::thread;

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let planner = Planner::open(SqliteTaskStore::open_in_memory().unwrap()).unwrap();
        let shared = SharedPlanner::new(planner);
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    (0..5)
                        .map(|n| {
                            shared
                                .with(|planner| {
                                    planner.create_task(
                                        &format!("job {worker}-{n}"),
                                        date,
                                        time,
                                        "tasks",
                                    )
                                })
                                .unwrap()
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, (0..20).collect::<Vec<i64>>());
    }

    #[test]
    fn poisoned_lock_reports_unavailable() {
        let planner = Planner::open(SqliteTaskStore::open_in_memory().unwrap()).unwrap();
        let shared = SharedPlanner::new(planner);

        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            poisoner.with::<()>(|_| panic!("boom")).ok();
        })
        .join();

        assert!(matches!(
            shared.prioritized(None).unwrap_err(),
            TaskError::Unavailable
        ));
    }
}
