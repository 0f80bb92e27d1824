#![cfg(feature = "sqlite")]

use chrono::{TimeZone, Utc};
use event_schedule::persistence::TaskStore;
use event_schedule::{
    AnchorInput, ScheduleRequest, Scheduler, SqliteTaskStore, Task, TaskId, Viewer,
};
use tempfile::NamedTempFile;

fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new("venue", "Book venue", 2.0),
        Task::new("catering", "Arrange catering", 1.0).with_dependencies(["venue"]),
        Task::new("speech", "Write speech", 3.0).private_to("alice"),
    ]
}

#[test]
fn sqlite_store_round_trip_catalogue() {
    let file = NamedTempFile::new().unwrap();
    let tasks = sample_tasks();

    {
        let mut store = SqliteTaskStore::new(file.path()).unwrap();
        store.save_tasks(&tasks).expect("save catalogue");
    }

    let store = SqliteTaskStore::new(file.path()).unwrap();
    let loaded = store.list_tasks().unwrap();
    assert_eq!(loaded, tasks);

    let speech = store.find_task(&TaskId::from("speech")).unwrap().unwrap();
    assert_eq!(speech.user_id.as_deref(), Some("alice"));
    assert!(store.find_task(&TaskId::from("nope")).unwrap().is_none());
}

#[test]
fn sqlite_upsert_replaces_and_delete_removes() {
    let mut store = SqliteTaskStore::in_memory().unwrap();
    store.save_tasks(&sample_tasks()).unwrap();

    let replaced = store
        .upsert_task(Task::new("venue", "Book bigger venue", 4.0))
        .unwrap();
    assert!(replaced);
    assert!(!store.upsert_task(Task::new("band", "Hire band", 1.0)).unwrap());

    let ids: Vec<String> = store
        .list_tasks()
        .unwrap()
        .into_iter()
        .map(|t| t.id.to_string())
        .collect();
    assert_eq!(ids, vec!["venue", "catering", "speech", "band"]);

    assert!(store.delete_task(&TaskId::from("band")).unwrap());
    assert!(!store.delete_task(&TaskId::from("band")).unwrap());
    assert!(store.upsert_task(Task::new("bad", "Bad", 0.0)).is_err());
}

#[test]
fn sqlite_store_serves_schedule_requests() {
    let mut store = SqliteTaskStore::in_memory().unwrap();
    store.save_tasks(&sample_tasks()).unwrap();

    let request = ScheduleRequest::new(
        ["catering", "venue"],
        Some(AnchorInput::Text("2024-06-01".into())),
    );
    let schedule = request
        .execute(&store, Viewer::Anonymous, &Scheduler::default())
        .unwrap();

    assert_eq!(
        schedule.get("catering").unwrap().start_time,
        Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap()
    );
}
