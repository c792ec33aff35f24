//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task board intents (create, edit, delete, toggle) and the host
//!   clock tick to Dart via FRB.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - The board lives on the calling (UI) thread; every call is sync.
//! - Task ids cross the boundary as strings.

use log::warn;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use taskflip_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BoardSnapshot, SqliteKeyValueStore, Task, TaskBoard, TaskDraft, TaskId, TaskPatch,
    ToggleOutcome, TransitionState,
};

const BOARD_DB_FILE_NAME: &str = "taskflip.sqlite3";
const BOARD_DB_PATH_ENV: &str = "TASKFLIP_DB_PATH";

thread_local! {
    static BOARD: RefCell<Option<TaskBoard<SqliteKeyValueStore>>> = const { RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One task as rendered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub is_completed: bool,
    /// `settled|exiting|entering`, for item styling.
    pub phase: String,
}

/// Board state for one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub open: Vec<TaskView>,
    pub done: Vec<TaskView>,
    /// `idle|exiting|entering`.
    pub transition: String,
    pub transition_task_id: Option<String>,
    /// `false` while a task is in flight; checkboxes render disabled.
    pub toggles_enabled: bool,
    pub open_count: u32,
    pub done_count: u32,
    pub total_count: u32,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the intent was applied.
    pub ok: bool,
    /// Task id touched by the action, when known.
    pub task_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            ok: true,
            task_id: task_id.map(|id| id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Opens (or reopens) the board backed by the SQLite file at `db_path`.
///
/// An empty `db_path` resolves from `TASKFLIP_DB_PATH`, then the temp dir.
#[flutter_rust_bridge::frb(sync)]
pub fn init_board(db_path: String) -> ActionResponse {
    let path = resolve_db_path(db_path.as_str());
    match SqliteKeyValueStore::open(&path) {
        Ok(store) => {
            let board = TaskBoard::load(store);
            let total = board.store().counts().total;
            BOARD.with(|slot| *slot.borrow_mut() = Some(board));
            ActionResponse::success(format!("Board loaded with {total} task(s)."), None)
        }
        Err(err) => ActionResponse::failure(format!("init_board failed: {err}")),
    }
}

/// Creates an open task after checking the create-form precondition.
#[flutter_rust_bridge::frb(sync)]
pub fn create_task(title: String, description: String, content: String) -> ActionResponse {
    let draft = TaskDraft::new(title.trim(), description.trim(), content);
    if let Err(err) = draft.validate() {
        return ActionResponse::failure(format!("create_task rejected: {err}"));
    }
    match with_board(|board| board.create(draft)) {
        Ok(id) => ActionResponse::success("Task created.", Some(id)),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Applies an edit from the view/edit form. `None` fields stay unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn update_task(
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    is_completed: Option<bool>,
) -> ActionResponse {
    let id = match parse_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let patch = TaskPatch {
        title,
        description,
        content,
        is_completed,
    };
    match with_board(|board| board.update(id, patch)) {
        Ok(true) => ActionResponse::success("Task updated.", Some(id)),
        Ok(false) => ActionResponse::success("Task no longer exists.", Some(id)),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Deletes a task from the open (`false`) or done (`true`) collection.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_task(task_id: String, from_completed: bool) -> ActionResponse {
    let id = match parse_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match with_board(|board| board.delete(id, from_completed)) {
        Ok(true) => ActionResponse::success("Task deleted.", Some(id)),
        Ok(false) => ActionResponse::success("Task already gone.", Some(id)),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Starts moving a task to the opposite collection.
///
/// `ok=false` when another task is in flight or the id is unknown.
#[flutter_rust_bridge::frb(sync)]
pub fn toggle_task(task_id: String) -> ActionResponse {
    let id = match parse_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match with_board(|board| board.toggle(id)) {
        Ok(ToggleOutcome::Started) => ActionResponse::success("Transition started.", Some(id)),
        Ok(ToggleOutcome::Busy) => ActionResponse::failure("Another task is moving."),
        Ok(ToggleOutcome::UnknownTask) => ActionResponse::failure("Task not found."),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Host tick: advances the board clock by `elapsed_ms` and returns the
/// resulting board state.
#[flutter_rust_bridge::frb(sync)]
pub fn advance_clock(elapsed_ms: u32) -> BoardView {
    with_board(|board| {
        board.advance(Duration::from_millis(u64::from(elapsed_ms)));
        to_board_view(board.snapshot())
    })
    .unwrap_or_else(|err| {
        warn!("event=ffi_advance module=ffi status=error error={err}");
        empty_view()
    })
}

/// Returns the current board state.
#[flutter_rust_bridge::frb(sync)]
pub fn board_snapshot() -> BoardView {
    with_board(|board| to_board_view(board.snapshot())).unwrap_or_else(|err| {
        warn!("event=ffi_snapshot module=ffi status=error error={err}");
        empty_view()
    })
}

fn with_board<T>(f: impl FnOnce(&TaskBoard<SqliteKeyValueStore>) -> T) -> Result<T, String> {
    BOARD.with(|slot| {
        if slot.borrow().is_none() {
            let path = resolve_db_path("");
            let store = SqliteKeyValueStore::open(&path)
                .map_err(|err| format!("board DB open failed: {err}"))?;
            *slot.borrow_mut() = Some(TaskBoard::load(store));
        }
        let guard = slot.borrow();
        guard
            .as_ref()
            .map(f)
            .ok_or_else(|| "board is not initialized".to_string())
    })
}

fn resolve_db_path(requested: &str) -> PathBuf {
    let trimmed = requested.trim();
    if !trimmed.is_empty() {
        return PathBuf::from(trimmed);
    }
    if let Ok(raw) = std::env::var(BOARD_DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(BOARD_DB_FILE_NAME)
}

fn parse_id(raw: &str) -> Result<TaskId, ActionResponse> {
    raw.parse::<TaskId>()
        .map_err(|err| ActionResponse::failure(err.to_string()))
}

fn to_board_view(snapshot: BoardSnapshot) -> BoardView {
    let transition = snapshot.transition;
    let view = |task: Task| to_task_view(task, transition);
    BoardView {
        open: snapshot.open.into_iter().map(view).collect(),
        done: snapshot.done.into_iter().map(view).collect(),
        transition: transition_label(transition).to_string(),
        transition_task_id: transition.task_id().map(|id| id.to_string()),
        toggles_enabled: transition.is_idle(),
        open_count: clamp_count(snapshot.counts.open),
        done_count: clamp_count(snapshot.counts.done),
        total_count: clamp_count(snapshot.counts.total),
    }
}

fn to_task_view(task: Task, transition: TransitionState) -> TaskView {
    let phase = match transition {
        TransitionState::Exiting(id) if id == task.id => "exiting",
        TransitionState::Entering(id) if id == task.id => "entering",
        _ => "settled",
    };
    TaskView {
        id: task.id.to_string(),
        title: task.title,
        description: task.description,
        content: task.content,
        is_completed: task.is_completed,
        phase: phase.to_string(),
    }
}

fn transition_label(state: TransitionState) -> &'static str {
    match state {
        TransitionState::Idle => "idle",
        TransitionState::Exiting(_) => "exiting",
        TransitionState::Entering(_) => "entering",
    }
}

fn clamp_count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn empty_view() -> BoardView {
    BoardView {
        open: Vec::new(),
        done: Vec::new(),
        transition: transition_label(TransitionState::Idle).to_string(),
        transition_task_id: None,
        toggles_enabled: true,
        open_count: 0,
        done_count: 0,
        total_count: 0,
    }
}
