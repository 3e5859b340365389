//! Tab-separated record codec for the flat-file store.
//!
//! Task line: `id, description, MM/DD/YYYY, HH:MM, list_name, True|False`.
//! The time field carries `:SS` only when the due time has seconds.
//! List line: `name, priority`. A bare `name` line loads with priority 1.

use super::{RepoError, RepoResult};
use crate::model::task::{format_due_time, parse_due_time, Task, TaskId, DATE_FORMAT};
use crate::model::task_list::{TaskList, DEFAULT_LIST_PRIORITY};
use chrono::NaiveDate;

const TASK_FIELD_COUNT: usize = 6;
const COMPLETED_TRUE: &str = "True";
const COMPLETED_FALSE: &str = "False";

/// Encodes one task as a line without trailing newline.
pub fn encode_task(task: &Task) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        task.id,
        task.description,
        task.due_date.format(DATE_FORMAT),
        format_due_time(task.due_time),
        task.list_name,
        if task.completed {
            COMPLETED_TRUE
        } else {
            COMPLETED_FALSE
        }
    )
}

/// Decodes one task line. `line_no` is 1-based and only used in errors.
pub fn decode_task(line: &str, line_no: usize) -> RepoResult<Task> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != TASK_FIELD_COUNT {
        return Err(invalid(
            line_no,
            format!(
                "expected {TASK_FIELD_COUNT} tab-separated fields, got {}",
                fields.len()
            ),
        ));
    }

    let id: TaskId = fields[0]
        .parse()
        .map_err(|_| invalid(line_no, format!("invalid task id `{}`", fields[0])))?;
    if id < 0 {
        return Err(invalid(line_no, format!("negative task id `{id}`")));
    }

    let due_date = NaiveDate::parse_from_str(fields[2], DATE_FORMAT)
        .map_err(|_| invalid(line_no, format!("invalid due date `{}`", fields[2])))?;
    let due_time = parse_due_time(fields[3])
        .ok_or_else(|| invalid(line_no, format!("invalid due time `{}`", fields[3])))?;

    let completed = match fields[5] {
        COMPLETED_TRUE => true,
        COMPLETED_FALSE => false,
        other => {
            return Err(invalid(
                line_no,
                format!("invalid completed flag `{other}`"),
            ))
        }
    };

    Ok(Task {
        id,
        description: fields[1].to_string(),
        due_date,
        due_time,
        list_name: fields[4].to_string(),
        completed,
    })
}

/// Encodes one list as a line without trailing newline.
pub fn encode_list(list: &TaskList) -> String {
    format!("{}\t{}", list.name, list.priority)
}

/// Decodes one list line.
pub fn decode_list(line: &str, line_no: usize) -> RepoResult<TaskList> {
    let (name, priority) = match line.split_once('\t') {
        Some((name, priority)) => {
            let priority: i64 = priority.trim().parse().map_err(|_| {
                invalid(line_no, format!("invalid list priority `{priority}`"))
            })?;
            (name, priority)
        }
        None => (line, i64::from(DEFAULT_LIST_PRIORITY)),
    };

    TaskList::new(name, priority).map_err(|err| invalid(line_no, err.to_string()))
}

fn invalid(line_no: usize, message: String) -> RepoError {
    RepoError::InvalidData(format!("line {line_no}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::{decode_list, decode_task, encode_list, encode_task};
    use crate::model::task::Task;
    use crate::model::task_list::TaskList;
    use crate::repo::RepoError;
    use chrono::{NaiveDate, NaiveTime};

    fn sample_task() -> Task {
        Task {
            id: 12,
            description: "buy \"good\" coffee".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            due_time: NaiveTime::from_hms_opt(8, 5, 0).unwrap(),
            list_name: "home".to_string(),
            completed: true,
        }
    }

    #[test]
    fn task_line_uses_documented_layout() {
        assert_eq!(
            encode_task(&sample_task()),
            "12\tbuy \"good\" coffee\t02/29/2024\t08:05\thome\tTrue"
        );
    }

    #[test]
    fn task_line_decodes_back() {
        let line = encode_task(&sample_task());
        assert_eq!(decode_task(&line, 1).unwrap(), sample_task());
    }

    #[test]
    fn task_line_with_wrong_field_count_is_invalid() {
        let err = decode_task("1\tonly\tthree", 3).unwrap_err();
        match err {
            RepoError::InvalidData(message) => assert!(message.starts_with("line 3:")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn completed_flag_must_be_literal() {
        let err = decode_task("1\tx\t01/01/2024\t10:00\ttasks\ttrue", 1).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn impossible_date_is_invalid() {
        let err = decode_task("1\tx\t02/30/2024\t10:00\ttasks\tFalse", 1).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn list_line_with_priority() {
        let list = TaskList::new("work", 4).unwrap();
        assert_eq!(encode_list(&list), "work\t4");
        assert_eq!(decode_list("work\t4", 1).unwrap(), list);
    }

    #[test]
    fn bare_list_line_gets_default_priority() {
        let list = decode_list("errands", 2).unwrap();
        assert_eq!(list.name, "errands");
        assert_eq!(list.priority, 1);
    }

    #[test]
    fn list_line_with_zero_priority_is_invalid() {
        let err = decode_list("work\t0", 5).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
