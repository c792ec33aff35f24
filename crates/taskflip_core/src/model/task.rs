//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record and its stored wire shape.
//! - Provide creation drafts and edit patches for form collaborators.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - Freshly created ids are random UUIDs; legacy numeric ids are accepted
//!   on read so previously stored data keeps loading.
//! - Wire fields stay camelCase: `{id, title, description, content, isCompleted}`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque task identity.
///
/// Serialized untagged: generated ids as UUID strings, legacy ids as the
/// millisecond timestamps older stored data used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    /// Collision-free id assigned by this crate.
    Generated(Uuid),
    /// Numeric id read from previously stored data.
    Legacy(u64),
}

impl TaskId {
    /// Generates a new random id.
    pub fn generate() -> Self {
        Self::Generated(Uuid::new_v4())
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated(uuid) => write!(f, "{uuid}"),
            Self::Legacy(value) => write!(f, "{value}"),
        }
    }
}

/// Error returned when text cannot be parsed into a `TaskId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskIdParseError(pub String);

impl Display for TaskIdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid task id: `{}`", self.0)
    }
}

impl Error for TaskIdParseError {}

impl FromStr for TaskId {
    type Err = TaskIdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(uuid) = Uuid::parse_str(trimmed) {
            return Ok(Self::Generated(uuid));
        }
        trimmed
            .parse::<u64>()
            .map(Self::Legacy)
            .map_err(|_| TaskIdParseError(trimmed.to_string()))
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Short headline.
    pub title: String,
    /// Short summary shown in lists.
    pub description: String,
    /// Full body; may be empty. Older records may omit it.
    #[serde(default)]
    pub content: String,
    /// Which collection holds the task: `false` open, `true` done.
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// Builds an open task from a draft with a caller-provided id.
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            content: draft.content,
            is_completed: false,
        }
    }
}

/// Input produced by the create-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub content: String,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            content: content.into(),
        }
    }

    /// Checks the create-form precondition.
    ///
    /// The task store does not call this; form collaborators do before
    /// submitting.
    ///
    /// # Errors
    /// - `EmptyTitle` when `title` is blank.
    /// - `EmptyDescription` when `description` is blank.
    pub fn validate(&self) -> Result<(), DraftValidationError> {
        if self.title.trim().is_empty() {
            return Err(DraftValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(DraftValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// Draft precondition violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl Display for DraftValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::EmptyDescription => write!(f, "task description cannot be empty"),
        }
    }
}

impl Error for DraftValidationError {}

/// Partial edit applied by `TaskStore::update`.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    /// Builds a full replacement patch from an edited copy of a task.
    ///
    /// The edit form hands back a whole task; `id` is ignored here because
    /// the store addresses tasks by the id passed to `update`.
    pub fn replace_with(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            content: Some(task.content.clone()),
            is_completed: Some(task.is_completed),
        }
    }

    /// Applies set fields to `task`.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(content) = self.content {
            task.content = content;
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DraftValidationError, Task, TaskDraft, TaskId, TaskPatch};

    #[test]
    fn generated_ids_are_unique() {
        let first = TaskId::generate();
        let second = TaskId::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn task_id_parses_uuid_and_legacy_forms() {
        let generated = TaskId::generate();
        assert_eq!(generated.to_string().parse::<TaskId>().expect("task id should parse"), generated);
        assert_eq!(
            "1700000000000".parse::<TaskId>().expect("task id should parse"),
            TaskId::Legacy(1_700_000_000_000)
        );
        assert!("not-an-id".parse::<TaskId>().is_err());
    }

    #[test]
    fn draft_validation_requires_title_and_description() {
        assert_eq!(
            TaskDraft::new("  ", "desc", "").validate(),
            Err(DraftValidationError::EmptyTitle)
        );
        assert_eq!(
            TaskDraft::new("title", "", "").validate(),
            Err(DraftValidationError::EmptyDescription)
        );
        assert!(TaskDraft::new("title", "desc", "").validate().is_ok());
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut task = Task::from_draft(TaskId::Legacy(1), TaskDraft::new("a", "b", "c"));
        TaskPatch {
            content: Some("updated".to_string()),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);

        assert_eq!(task.title, "a");
        assert_eq!(task.description, "b");
        assert_eq!(task.content, "updated");
        assert!(!task.is_completed);
    }
}
