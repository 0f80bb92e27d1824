use event_schedule::task_validation::{validate_task, validate_task_collection};
use event_schedule::{OffsetUnit, Relation, Task, TimingRule};

#[test]
fn well_formed_task_passes() {
    let task = Task::new("A", "Setup", 1.5)
        .with_dependencies(["B"])
        .with_timing(TimingRule::before(10.0, OffsetUnit::Minutes));
    assert!(validate_task(&task).is_ok());
}

#[test]
fn non_positive_or_non_finite_duration_fails() {
    for duration in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let task = Task::new("A", "Setup", duration);
        let err = validate_task(&task).unwrap_err();
        assert!(err.to_string().contains("invalid duration"), "{err}");
    }
}

#[test]
fn negative_offset_fails() {
    let task = Task::new("A", "Setup", 1.0)
        .with_timing(TimingRule::new(Relation::After, -5.0, OffsetUnit::Minutes));
    let err = validate_task(&task).unwrap_err();
    assert!(err.to_string().contains("invalid timing offset"));
}

#[test]
fn blank_description_fails() {
    let task = Task::new("A", "   ", 1.0);
    assert!(validate_task(&task).is_err());
}

#[test]
fn private_task_requires_owner() {
    let mut task = Task::new("A", "Setup", 1.0).private_to("alice");
    assert!(validate_task(&task).is_ok());

    task.user_id = None;
    let err = validate_task(&task).unwrap_err();
    assert!(err.to_string().contains("requires an owner"));
}

#[test]
fn collection_rejects_duplicate_ids() {
    let tasks = vec![Task::new("A", "one", 1.0), Task::new("A", "two", 1.0)];
    let err = validate_task_collection(&tasks).unwrap_err();
    assert_eq!(err.to_string(), "duplicate task id A");
}

#[test]
fn task_json_uses_defaults_for_optional_fields() {
    let task: Task = serde_json::from_value(serde_json::json!({
        "_id": "A",
        "description": "Setup",
        "duration": 2,
        "isGlobal": true
    }))
    .unwrap();

    assert_eq!(task.id.as_str(), "A");
    assert!(task.dependencies.is_empty());
    assert_eq!(task.timing, TimingRule::default());
    assert_eq!(task.timing.relation, Relation::After);
    assert_eq!(task.timing.unit, OffsetUnit::Minutes);
    assert!(task.start_date.is_none());
    assert!(validate_task(&task).is_ok());
}

#[test]
fn unknown_unit_is_rejected_when_parsing() {
    let result: Result<Task, _> = serde_json::from_value(serde_json::json!({
        "id": "A",
        "description": "Setup",
        "duration": 1,
        "timing": { "relation": "after", "offset": 1, "unit": "weeks" }
    }));
    assert!(result.is_err());
}
