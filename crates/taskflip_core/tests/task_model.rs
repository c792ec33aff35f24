use taskflip_core::{Task, TaskDraft, TaskId, TaskPatch};
use uuid::Uuid;

#[test]
fn new_task_from_draft_starts_open() {
    let id = TaskId::generate();
    let task = Task::from_draft(id, TaskDraft::new("Buy milk", "groceries", ""));

    assert_eq!(task.id, id);
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, "groceries");
    assert_eq!(task.content, "");
    assert!(!task.is_completed);
}

#[test]
fn task_serialization_uses_camel_case_wire_fields() {
    let uuid = Uuid::parse_str("11111111-2222-4333-8444-555555555555").expect("uuid literal should parse");
    let mut task = Task::from_draft(
        TaskId::Generated(uuid),
        TaskDraft::new("Ship release", "weekly", "tag and publish"),
    );
    task.is_completed = true;

    let json = serde_json::to_value(&task).expect("task should serialize");
    assert_eq!(json["id"], uuid.to_string());
    assert_eq!(json["title"], "Ship release");
    assert_eq!(json["description"], "weekly");
    assert_eq!(json["content"], "tag and publish");
    assert_eq!(json["isCompleted"], true);

    let decoded: Task = serde_json::from_value(json).expect("task should deserialize");
    assert_eq!(decoded, task);
}

#[test]
fn legacy_records_decode_with_numeric_ids_and_missing_content() {
    let raw = r#"{"id":1712345678901,"title":"Old","description":"from before","isCompleted":false}"#;
    let task: Task = serde_json::from_str(raw).expect("legacy task should deserialize");

    assert_eq!(task.id, TaskId::Legacy(1_712_345_678_901));
    assert_eq!(task.content, "");

    let json = serde_json::to_value(&task).expect("task should serialize");
    assert_eq!(json["id"], 1_712_345_678_901_u64);
}

#[test]
fn replacement_patch_copies_every_editable_field() {
    let mut edited = Task::from_draft(TaskId::Legacy(7), TaskDraft::new("a", "b", "c"));
    edited.title = "new title".to_string();
    edited.is_completed = true;

    let patch = TaskPatch::replace_with(&edited);
    assert_eq!(patch.title.as_deref(), Some("new title"));
    assert_eq!(patch.description.as_deref(), Some("b"));
    assert_eq!(patch.content.as_deref(), Some("c"));
    assert_eq!(patch.is_completed, Some(true));

    let mut untouched = edited.clone();
    TaskPatch::default().apply_to(&mut untouched);
    assert_eq!(untouched, edited);
}
