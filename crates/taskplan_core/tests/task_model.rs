use chrono::{NaiveDate, NaiveTime};
use taskplan_core::{NewTask, Task, TaskList, ValidationError, DEFAULT_LIST_NAME};

fn sample_task() -> Task {
    NewTask::new(
        "renew passport",
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        "errands",
    )
    .into_task(4)
}

#[test]
fn new_task_materializes_open_record() {
    let task = sample_task();
    assert_eq!(task.id, 4);
    assert!(task.is_open());
    assert_eq!(
        task.due_at(),
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    );
}

#[test]
fn task_serialization_uses_expected_wire_fields() {
    let task = sample_task();

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], 4);
    assert_eq!(json["description"], "renew passport");
    assert_eq!(json["due_date"], "2025-03-01");
    assert_eq!(json["due_time"], "08:30:00");
    assert_eq!(json["list_name"], "errands");
    assert_eq!(json["completed"], false);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn list_serialization_keeps_weight() {
    let list = TaskList::new("work", 2).unwrap();
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(json, serde_json::json!({ "name": "work", "priority": 2 }));
}

#[test]
fn default_list_is_recognized() {
    let list = TaskList::default_list();
    assert_eq!(list.name, DEFAULT_LIST_NAME);
    assert_eq!(list.priority, 1);
    assert!(list.is_default());
    assert!(!TaskList::new("work", 1).unwrap().is_default());
}

#[test]
fn list_name_with_tab_is_rejected() {
    assert_eq!(
        TaskList::new("a\tb", 1).unwrap_err(),
        ValidationError::ReservedCharacter { field: "list name" }
    );
}
