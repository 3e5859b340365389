//! SQLite-backed task store.
//!
//! # Responsibility
//! - Persist lists and tasks in the migrated `task_lists` / `tasks` tables.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - The store owns its connection; dropping the store closes it.
//! - Multi-statement mutations run in one `IMMEDIATE` transaction.
//! - `tasks.list_name` cascades on list deletion through the schema.

use super::{derive_next_id, RepoError, RepoResult, TaskQuery, TaskStore};
use crate::db::migrations::{latest_version, schema_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::task::{format_due_time, parse_due_time, NewTask, Task, TaskId};
use crate::model::task_list::TaskList;
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    description,
    due_date,
    due_time,
    list_name,
    completed
FROM tasks";

const DB_DATE_FORMAT: &str = "%Y-%m-%d";

/// Task store over one exclusively owned SQLite connection.
pub struct SqliteTaskStore {
    conn: Connection,
    last_issued: Option<TaskId>,
}

impl SqliteTaskStore {
    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - `DbError::SchemaNotMigrated` when the connection is not at the
    ///   schema version this binary expects.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn,
            last_issued: None,
        })
    }

    /// Opens (creating if needed) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let store = Self::try_new(open_db(path)?)?;
        info!(
            "event=store_open module=repo status=ok backend=sqlite path={}",
            path.display()
        );
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Borrow of the underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn list_exists(conn: &Connection, name: &str) -> RepoResult<bool> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM task_lists WHERE name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn max_task_id(conn: &Connection) -> RepoResult<Option<TaskId>> {
        let max = conn.query_row("SELECT MAX(id) FROM tasks;", [], |row| {
            row.get::<_, Option<TaskId>>(0)
        })?;
        Ok(max)
    }
}

impl TaskStore for SqliteTaskStore {
    fn load_lists(&self) -> RepoResult<Vec<TaskList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, priority FROM task_lists ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let priority: i64 = row.get(1)?;
            let list = TaskList::new(&name, priority).map_err(|err| {
                RepoError::InvalidData(format!("task_lists row `{name}`: {err}"))
            })?;
            lists.push(list);
        }
        Ok(lists)
    }

    fn insert_list(&mut self, list: &TaskList) -> RepoResult<()> {
        list.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if Self::list_exists(&tx, &list.name)? {
            return Err(RepoError::DuplicateList(list.name.clone()));
        }
        tx.execute(
            "INSERT INTO task_lists (name, priority) VALUES (?1, ?2);",
            params![list.name.as_str(), i64::from(list.priority)],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_list(&mut self, name: &str) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::list_exists(&tx, name)? {
            return Err(RepoError::UnknownList(name.to_string()));
        }
        let removed = tx.execute("DELETE FROM tasks WHERE list_name = ?1;", [name])?;
        tx.execute("DELETE FROM task_lists WHERE name = ?1;", [name])?;
        tx.commit()?;
        debug!(
            "event=list_delete module=repo status=ok backend=sqlite list={} removed_tasks={}",
            name, removed
        );
        Ok(removed)
    }

    fn cascade_delete_by_list(&mut self, name: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE list_name = ?1;", [name])?;
        Ok(removed)
    }

    fn create_task(&mut self, task: &NewTask) -> RepoResult<Task> {
        task.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::list_exists(&tx, &task.list_name)? {
            return Err(RepoError::UnknownList(task.list_name.clone()));
        }

        let id = derive_next_id(Self::max_task_id(&tx)?, self.last_issued)?;
        tx.execute(
            "INSERT INTO tasks (
                id,
                description,
                due_date,
                due_time,
                list_name,
                completed
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                id,
                task.description.as_str(),
                task.due_date.format(DB_DATE_FORMAT).to_string(),
                format_due_time(task.due_time),
                task.list_name.as_str(),
            ],
        )?;
        tx.commit()?;

        self.last_issued = Some(id);
        Ok(task.clone().into_task(id))
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn delete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn complete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                completed = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1 AND completed = 0;",
            [id],
        )?;
        if changed == 1 {
            return Ok(());
        }

        let completed = self
            .conn
            .query_row("SELECT completed FROM tasks WHERE id = ?1;", [id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        match completed {
            Some(_) => Err(RepoError::AlreadyCompleted(id)),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_completed {
            sql.push_str(" AND completed = 0");
        }

        if let Some(lists) = query.list_filter() {
            let placeholders = vec!["?"; lists.len()].join(", ");
            sql.push_str(&format!(" AND list_name IN ({placeholders})"));
            bind_values.extend(lists.iter().map(|name| Value::Text(name.clone())));
        }

        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn next_task_id(&self) -> RepoResult<TaskId> {
        derive_next_id(Self::max_task_id(&self.conn)?, self.last_issued)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;

    let date_text: String = row.get("due_date")?;
    let due_date = NaiveDate::parse_from_str(&date_text, DB_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid due_date `{date_text}` for task {id}"))
    })?;

    let time_text: String = row.get("due_time")?;
    let due_time = parse_due_time(&time_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid due_time `{time_text}` for task {id}"))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` for task {id}"
            )));
        }
    };

    Ok(Task {
        id,
        description: row.get("description")?,
        due_date,
        due_time,
        list_name: row.get("list_name")?,
        completed,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected = latest_version();
    let db_version = schema_version(conn)?;
    if db_version != expected {
        return Err(RepoError::Db(DbError::SchemaNotMigrated {
            db_version,
            expected,
        }));
    }

    for table in ["task_lists", "tasks"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(format!(
                "required table `{table}` is missing"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SqliteTaskStore;
    use crate::model::task::NewTask;
    use crate::model::task_list::TaskList;
    use crate::repo::{RepoError, TaskQuery, TaskStore};
    use chrono::{NaiveDate, NaiveTime};

    fn new_task(list: &str) -> NewTask {
        NewTask::new(
            "water plants",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
            list,
        )
    }

    #[test]
    fn default_list_is_seeded_by_migration() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let lists = store.load_lists().unwrap();
        assert_eq!(lists, vec![TaskList::default_list()]);
    }

    #[test]
    fn create_task_rejects_unknown_list_without_writing() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let err = store.create_task(&new_task("nowhere")).unwrap_err();
        assert!(matches!(err, RepoError::UnknownList(name) if name == "nowhere"));
        assert!(store.list_tasks(&TaskQuery::all(None)).unwrap().is_empty());
    }

    #[test]
    fn complete_twice_reports_already_completed() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let task = store.create_task(&new_task("tasks")).unwrap();
        store.complete_task(task.id).unwrap();
        let err = store.complete_task(task.id).unwrap_err();
        assert!(matches!(err, RepoError::AlreadyCompleted(id) if id == task.id));
        assert!(matches!(
            store.complete_task(999).unwrap_err(),
            RepoError::NotFound(999)
        ));
    }

    #[test]
    fn time_round_trips_through_text_columns() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let task = store.create_task(&new_task("tasks")).unwrap();
        let loaded = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(loaded, task);
    }

    #[test]
    fn seconds_survive_the_time_column() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let mut request = new_task("tasks");
        request.due_time = NaiveTime::from_hms_opt(7, 45, 30).unwrap();
        let task = store.create_task(&request).unwrap();
        let loaded = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(loaded.due_time, request.due_time);
    }
}
