//! Plain-text rendering of dispatcher outcomes.

use taskplan_core::{
    format_due_time, BatchAction, BatchItem, Outcome, RankedTask, Task, TaskList,
    DATE_FORMAT, DEFAULT_LIST_NAME,
};

const DONE_MARKER: &str = "  (done)";

/// Renders one outcome as zero or more lines, each ending in `\n`.
pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::TaskCreated(id) => format!("created task {id}\n"),
        Outcome::ListCreated(list) => {
            format!("created list {} (priority {})\n", list.name, list.priority)
        }
        Outcome::ListDeleted {
            name,
            removed_tasks,
        } => format!("deleted list {name} and {removed_tasks} task(s)\n"),
        Outcome::Batch { action, items } => render_batch(*action, items),
        Outcome::Tasks(tasks) => render_tasks(tasks),
        Outcome::Ranked(ranked) => render_ranked(ranked),
        Outcome::Lists(lists) => render_lists(lists),
        Outcome::Help(text) => format!("{text}\n"),
        Outcome::Exit => String::new(),
    }
}

/// `id  MM/DD/YYYY HH:MM  [list]  description`, plus a marker when done.
pub fn render_task(task: &Task) -> String {
    format!(
        "{:>4}  {} {}  [{}]  {}{}",
        task.id,
        task.due_date.format(DATE_FORMAT),
        format_due_time(task.due_time),
        task.list_name,
        task.description,
        if task.completed { DONE_MARKER } else { "" }
    )
}

fn render_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "no tasks\n".to_string();
    }
    tasks
        .iter()
        .map(|task| format!("{}\n", render_task(task)))
        .collect()
}

fn render_ranked(ranked: &[RankedTask]) -> String {
    if ranked.is_empty() {
        return "no open tasks\n".to_string();
    }
    ranked
        .iter()
        .map(|item| format!("{}  urgency={:.1}\n", render_task(&item.task), item.urgency))
        .collect()
}

fn render_lists(lists: &[TaskList]) -> String {
    lists
        .iter()
        .map(|list| {
            let marker = if list.name == DEFAULT_LIST_NAME {
                "  (default)"
            } else {
                ""
            };
            format!("{}  priority={}{}\n", list.name, list.priority, marker)
        })
        .collect()
}

fn render_batch(action: BatchAction, items: &[BatchItem]) -> String {
    let verb = match action {
        BatchAction::Delete => "deleted",
        BatchAction::Complete => "completed",
    };
    items
        .iter()
        .map(|item| match &item.result {
            Ok(()) => format!("{verb} task {}\n", item.id),
            Err(err) => format!("error: {err}\n"),
        })
        .collect()
}
