use std::rc::Rc;
use taskflip_core::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, TaskCollectionRepository,
    TaskDraft, TaskId, TaskPatch, TaskStore, DONE_TASKS_KEY, OPEN_TASKS_KEY,
};

fn draft(title: &str) -> TaskDraft {
    TaskDraft::new(title, "summary", "")
}

#[test]
fn create_buy_milk_scenario() {
    let mut store = TaskStore::load(MemoryKeyValueStore::new());

    let id = store.create(TaskDraft::new("Buy milk", "groceries", ""));

    assert_eq!(store.open_tasks().len(), 1);
    assert_eq!(store.done_tasks().len(), 0);
    let task = store.get(id).expect("read should succeed");
    assert!(!task.is_completed);
    assert_eq!(task.content, "");
}

#[test]
fn create_always_grows_open_by_one() {
    let mut store = TaskStore::load(MemoryKeyValueStore::new());

    for index in 0..5 {
        let before = store.counts();
        let id = store.create(draft(&format!("task {index}")));
        let after = store.counts();

        assert_eq!(after.open, before.open + 1);
        assert_eq!(after.done, before.done);
        assert_eq!(store.location_of(id), Some(false));
        assert!(store.done_tasks().iter().all(|task| task.id != id));
    }
    assert_eq!(store.counts().total, 5);
}

#[test]
fn delete_of_non_member_leaves_collections_unchanged() {
    let mut store = TaskStore::load(MemoryKeyValueStore::new());
    store.create(draft("keep"));
    let before = store.collections();

    assert!(!store.delete(TaskId::generate(), false));
    assert!(!store.delete(TaskId::generate(), true));
    assert_eq!(store.collections(), before);
}

#[test]
fn edits_against_deleted_tasks_are_ignored() {
    let mut store = TaskStore::load(MemoryKeyValueStore::new());
    let id = store.create(draft("short lived"));
    assert!(store.delete(id, false));

    let applied = store.update(
        id,
        TaskPatch {
            title: Some("too late".to_string()),
            ..TaskPatch::default()
        },
    );
    assert!(!applied);
    assert_eq!(store.counts().total, 0);
}

#[test]
fn collections_survive_reload_through_sqlite_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("tasks.db");

    let expected = {
        let mut store = TaskStore::load(SqliteKeyValueStore::open(&path).expect("file store should open"));
        let first = store.create(TaskDraft::new("Buy milk", "groceries", ""));
        store.create(TaskDraft::new("Write report", "work", "quarterly numbers"));
        store.update(
            first,
            TaskPatch {
                is_completed: Some(true),
                ..TaskPatch::default()
            },
        );
        store.collections()
    };

    let reloaded = TaskStore::load(SqliteKeyValueStore::open(&path).expect("file store should open"));
    assert_eq!(reloaded.collections(), expected);
    assert_eq!(reloaded.counts().open, 1);
    assert_eq!(reloaded.counts().done, 1);
}

#[test]
fn both_keys_are_rewritten_on_every_commit() {
    let kv = Rc::new(MemoryKeyValueStore::new());
    let mut store = TaskStore::load(Rc::clone(&kv));

    store.create(draft("only open changes"));

    assert!(kv.get(OPEN_TASKS_KEY).expect("read should succeed").is_some());
    assert!(kv.get(DONE_TASKS_KEY).expect("read should succeed").is_some());
}

#[test]
fn malformed_entries_load_as_empty() {
    let kv = Rc::new(MemoryKeyValueStore::new());
    kv.set(OPEN_TASKS_KEY, "{definitely not json").expect("write should succeed");
    kv.set(DONE_TASKS_KEY, r#"[{"id":1,"title":"a","description":"b","content":"","isCompleted":true}]"#)
        .expect("write should succeed");

    let store = TaskStore::load(Rc::clone(&kv));

    assert!(store.open_tasks().is_empty());
    assert_eq!(store.done_tasks().len(), 1);
    assert_eq!(store.done_tasks()[0].id, TaskId::Legacy(1));
}

#[test]
fn legacy_unversioned_data_is_upgraded_on_next_save() {
    let kv = Rc::new(MemoryKeyValueStore::new());
    kv.set(
        OPEN_TASKS_KEY,
        r#"[{"id":1700000000000,"title":"Legacy","description":"old app","content":"body","isCompleted":false}]"#,
    )
    .expect("write should succeed");

    let mut store = TaskStore::load(Rc::clone(&kv));
    assert_eq!(store.open_tasks().len(), 1);
    store.create(draft("new"));

    let raw = kv.get(OPEN_TASKS_KEY).expect("read should succeed").expect("open tasks should be stored");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("stored value should be json");
    assert_eq!(json["schemaVersion"], 1);
    assert_eq!(json["tasks"][0]["id"], 1_700_000_000_000_u64);
    assert_eq!(json["tasks"].as_array().expect("tasks should be an array").len(), 2);
}

#[test]
fn repository_round_trip_preserves_collections() {
    let repo = TaskCollectionRepository::new(MemoryKeyValueStore::new());
    let mut store = TaskStore::load(MemoryKeyValueStore::new());
    let id = store.create(draft("a"));
    store.create(draft("b"));
    store.update(
        id,
        TaskPatch {
            is_completed: Some(true),
            ..TaskPatch::default()
        },
    );
    let before = store.collections();

    repo.save_collections(&before.open, &before.done).expect("collections should save");

    assert_eq!(repo.load_collections(), before);
}
