use chrono::{TimeZone, Utc};
use event_schedule::persistence::{InMemoryTaskStore, TaskStore};
use event_schedule::{
    OffsetUnit, PersistenceError, Task, TaskId, TimingRule, compute_schedule,
    load_event_from_json, load_tasks_from_json, save_schedule_to_csv, save_tasks_to_json,
    write_schedule_csv,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new("A", "Setup", 2.0),
        Task::new("B", "Rehearsal", 1.0)
            .with_dependencies(["A"])
            .with_timing(TimingRule::after(30.0, OffsetUnit::Minutes)),
        Task::new("C", "Doors open", 0.5)
            .with_start_date(Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap())
            .private_to("alice"),
    ]
}

#[test]
fn json_catalogue_round_trip() {
    let file = NamedTempFile::new().unwrap();
    let tasks = sample_tasks();

    save_tasks_to_json(&tasks, file.path()).unwrap();
    let loaded = load_tasks_from_json(file.path()).unwrap();

    assert_eq!(loaded, tasks);
}

#[test]
fn bare_array_catalogue_is_accepted() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"_id":"A","description":"Setup","duration":1,"isGlobal":true,
             "timing":{{"relation":"before","offset":2,"unit":"hours"}}}}]"#
    )
    .unwrap();

    let loaded = load_tasks_from_json(file.path()).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].timing, TimingRule::before(2.0, OffsetUnit::Hours));
}

#[test]
fn invalid_catalogue_is_rejected_on_load() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"tasks":[{{"id":"A","description":"Setup","duration":-1,"isGlobal":true}}]}}"#
    )
    .unwrap();

    let err = load_tasks_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = load_tasks_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::Serialization(_)));
}

#[test]
fn event_without_tasks_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"id":"e1","title":"Empty","date":"2024-01-01T09:00:00Z","tasks":[]}}"#
    )
    .unwrap();

    let err = load_event_from_json(file.path()).unwrap_err();
    assert!(err.to_string().contains("has no tasks"));
}

#[test]
fn schedule_csv_has_one_row_per_task() {
    let tasks = &sample_tasks()[..2];
    let schedule = compute_schedule(tasks, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
        .unwrap();

    let mut buffer = Vec::new();
    write_schedule_csv(&schedule, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "task_id,description,start_time,end_time,duration_hours,dependencies,is_fixed_start"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("A,Setup,2024-01-01T09:00:00+00:00,2024-01-01T11:00:00+00:00"));
    assert!(lines[2].starts_with("B,Rehearsal,2024-01-01T11:30:00+00:00"));
    assert!(lines[2].ends_with(",A,false"));

    let file = NamedTempFile::new().unwrap();
    save_schedule_to_csv(&schedule, file.path()).unwrap();
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), text);
}

#[test]
fn in_memory_store_upsert_and_delete() {
    let mut store = InMemoryTaskStore::from_tasks(sample_tasks()).unwrap();
    assert_eq!(store.len(), 3);

    let replaced = store
        .upsert_task(Task::new("A", "Setup (revised)", 3.0))
        .unwrap();
    assert!(replaced);
    let inserted = store.upsert_task(Task::new("D", "Teardown", 1.0)).unwrap();
    assert!(!inserted);

    let found = store.find_task(&TaskId::from("A")).unwrap().unwrap();
    assert_eq!(found.description, "Setup (revised)");

    assert!(store.delete_task(&TaskId::from("B")).unwrap());
    assert!(!store.delete_task(&TaskId::from("B")).unwrap());

    let ids: Vec<TaskId> = ["D", "A", "zzz"].into_iter().map(TaskId::from).collect();
    let fetched: Vec<String> = store
        .get_tasks(&ids)
        .unwrap()
        .into_iter()
        .map(|t| t.id.to_string())
        .collect();
    assert_eq!(fetched, vec!["D", "A"]);
}
