//! Flat-file task store.
//!
//! # Responsibility
//! - Persist lists and tasks as tab-separated text under one directory.
//! - Keep an in-memory mirror so reads never touch the disk.
//!
//! # Invariants
//! - Every write replaces the target file through a temporary file in the
//!   same directory followed by an atomic rename.
//! - The in-memory mirror changes only after the rename succeeds.
//! - Each mutation is all-or-nothing except `delete_list`, which rewrites
//!   the task file and then the list file. A failure between the two leaves
//!   the list present with its tasks already removed.
//! - Tasks are kept ordered by id.

use super::record::{decode_list, decode_task, encode_list, encode_task};
use super::{derive_next_id, RepoError, RepoResult, TaskQuery, TaskStore};
use crate::model::task::{NewTask, Task, TaskId};
use crate::model::task_list::{TaskList, DEFAULT_LIST_NAME};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File holding one task record per line.
pub const TASKS_FILE_NAME: &str = "tasks.txt";
/// File holding one list record per line.
pub const LISTS_FILE_NAME: &str = "lists.txt";

/// Task store over two text files in a data directory.
#[derive(Debug)]
pub struct FileTaskStore {
    dir: PathBuf,
    lists: Vec<TaskList>,
    tasks: Vec<Task>,
    last_issued: Option<TaskId>,
}

impl FileTaskStore {
    /// Opens the store rooted at `dir`, creating the directory and both
    /// files when missing.
    ///
    /// # Errors
    /// - `RepoError::Io` when the directory or files cannot be created or read.
    /// - `RepoError::InvalidData` for malformed lines, duplicate ids or list
    ///   names, and tasks that reference a list not in the list file.
    pub fn open(dir: impl AsRef<Path>) -> RepoResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut store = Self {
            dir,
            lists: Vec::new(),
            tasks: Vec::new(),
            last_issued: None,
        };

        let lists_path = store.lists_path();
        if lists_path.exists() {
            store.lists = read_lists(&lists_path)?;
        }
        if !store.lists.iter().any(TaskList::is_default) {
            let mut lists = store.lists.clone();
            lists.insert(0, TaskList::default_list());
            store.write_lists(&lists)?;
            store.lists = lists;
        }

        let tasks_path = store.tasks_path();
        if tasks_path.exists() {
            store.tasks = read_tasks(&tasks_path, &store.lists)?;
        } else {
            store.write_tasks(&[])?;
        }

        info!(
            "event=store_open module=repo status=ok backend=file lists={} tasks={}",
            store.lists.len(),
            store.tasks.len()
        );
        Ok(store)
    }

    /// Directory holding the store files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE_NAME)
    }

    fn lists_path(&self) -> PathBuf {
        self.dir.join(LISTS_FILE_NAME)
    }

    fn write_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        let contents: String = tasks
            .iter()
            .map(|task| encode_task(task) + "\n")
            .collect();
        write_atomic(&self.dir, &self.tasks_path(), &contents)
    }

    fn write_lists(&self, lists: &[TaskList]) -> RepoResult<()> {
        let contents: String = lists
            .iter()
            .map(|list| encode_list(list) + "\n")
            .collect();
        write_atomic(&self.dir, &self.lists_path(), &contents)
    }

    fn position_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.binary_search_by_key(&id, |task| task.id).ok()
    }

    fn has_list(&self, name: &str) -> bool {
        self.lists.iter().any(|list| list.name == name)
    }

    fn max_task_id(&self) -> Option<TaskId> {
        self.tasks.last().map(|task| task.id)
    }
}

impl TaskStore for FileTaskStore {
    fn load_lists(&self) -> RepoResult<Vec<TaskList>> {
        let mut lists = self.lists.clone();
        lists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lists)
    }

    fn insert_list(&mut self, list: &TaskList) -> RepoResult<()> {
        list.validate()?;
        if self.has_list(&list.name) {
            return Err(RepoError::DuplicateList(list.name.clone()));
        }
        let mut lists = self.lists.clone();
        lists.push(list.clone());
        self.write_lists(&lists)?;
        self.lists = lists;
        Ok(())
    }

    /// Two-file mutation: tasks first, then the list. Not atomic as a whole;
    /// see the module invariants.
    fn delete_list(&mut self, name: &str) -> RepoResult<usize> {
        if !self.has_list(name) {
            return Err(RepoError::UnknownList(name.to_string()));
        }
        // Tasks first: an interrupted delete may leave an empty list, never orphans.
        let removed = self.cascade_delete_by_list(name)?;

        let lists: Vec<TaskList> = self
            .lists
            .iter()
            .filter(|list| list.name != name)
            .cloned()
            .collect();
        self.write_lists(&lists)?;
        self.lists = lists;
        debug!(
            "event=list_delete module=repo status=ok backend=file list={} removed_tasks={}",
            name, removed
        );
        Ok(removed)
    }

    fn cascade_delete_by_list(&mut self, name: &str) -> RepoResult<usize> {
        let kept: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.list_name != name)
            .cloned()
            .collect();
        let removed = self.tasks.len() - kept.len();
        if removed == 0 {
            return Ok(0);
        }
        self.write_tasks(&kept)?;
        self.tasks = kept;
        Ok(removed)
    }

    fn create_task(&mut self, task: &NewTask) -> RepoResult<Task> {
        task.validate()?;
        if !self.has_list(&task.list_name) {
            return Err(RepoError::UnknownList(task.list_name.clone()));
        }

        let id = derive_next_id(self.max_task_id(), self.last_issued)?;
        let created = task.clone().into_task(id);

        let mut tasks = self.tasks.clone();
        tasks.push(created.clone());
        self.write_tasks(&tasks)?;
        self.tasks = tasks;
        self.last_issued = Some(id);
        Ok(created)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        Ok(self.position_of(id).map(|index| self.tasks[index].clone()))
    }

    fn delete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let index = self.position_of(id).ok_or(RepoError::NotFound(id))?;
        let mut tasks = self.tasks.clone();
        tasks.remove(index);
        self.write_tasks(&tasks)?;
        self.tasks = tasks;
        Ok(())
    }

    fn complete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let index = self.position_of(id).ok_or(RepoError::NotFound(id))?;
        if self.tasks[index].completed {
            return Err(RepoError::AlreadyCompleted(id));
        }
        let mut tasks = self.tasks.clone();
        tasks[index].completed = true;
        self.write_tasks(&tasks)?;
        self.tasks = tasks;
        Ok(())
    }

    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| query.matches(task))
            .cloned()
            .collect())
    }

    fn next_task_id(&self) -> RepoResult<TaskId> {
        derive_next_id(self.max_task_id(), self.last_issued)
    }
}

fn read_lists(path: &Path) -> RepoResult<Vec<TaskList>> {
    let contents = fs::read_to_string(path)?;
    let mut lists: Vec<TaskList> = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let list = decode_list(line, index + 1)?;
        if lists.iter().any(|existing| existing.name == list.name) {
            return Err(RepoError::InvalidData(format!(
                "line {}: duplicate list `{}` in {LISTS_FILE_NAME}",
                index + 1,
                list.name
            )));
        }
        lists.push(list);
    }
    if !lists.iter().any(|list| list.name == DEFAULT_LIST_NAME) {
        warn!("event=store_open module=repo status=repair backend=file reason=default_list_missing");
    }
    Ok(lists)
}

fn read_tasks(path: &Path, lists: &[TaskList]) -> RepoResult<Vec<Task>> {
    let contents = fs::read_to_string(path)?;
    let known_lists: HashSet<&str> = lists.iter().map(|list| list.name.as_str()).collect();
    let mut tasks = Vec::new();
    let mut seen_ids = HashSet::new();

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let task = decode_task(line, line_no)?;
        if !seen_ids.insert(task.id) {
            return Err(RepoError::InvalidData(format!(
                "line {line_no}: duplicate task id {} in {TASKS_FILE_NAME}",
                task.id
            )));
        }
        if !known_lists.contains(task.list_name.as_str()) {
            return Err(RepoError::InvalidData(format!(
                "line {line_no}: task {} references unknown list `{}`",
                task.id, task.list_name
            )));
        }
        tasks.push(task);
    }

    tasks.sort_by_key(|task| task.id);
    Ok(tasks)
}

fn write_atomic(dir: &Path, target: &Path, contents: &str) -> RepoResult<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|err| RepoError::Io(err.error))?;
    Ok(())
}
