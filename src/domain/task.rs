//! Task entity
//!
//! A task is either a main task (`parent_id == None`, depth 0) or a sub-task
//! (`parent_id` referencing a main task, depth 1). The hierarchy is capped at
//! two levels; parent resolution is the board's job since the entity has no
//! access to the collection.
//!
//! Wire format matches the export document: camelCase field names and
//! millisecond epoch timestamps. Unknown per-task fields survive a round-trip
//! through the flattened `extra` map.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::{StoreError, StoreResult};
use super::id::TaskId;

/// Returns the current logical clock value in milliseconds since epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Prompt rendering preference, carried per task and as a global setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    #[default]
    FullCode,
    CodeChanges,
    Notes,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::FullCode => "full-code",
            PromptMode::CodeChanges => "code-changes",
            PromptMode::Notes => "notes",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-code" => Ok(PromptMode::FullCode),
            "code-changes" => Ok(PromptMode::CodeChanges),
            "notes" => Ok(PromptMode::Notes),
            other => Err(StoreError::Validation(format!(
                "unknown prompt mode '{}' (expected full-code, code-changes or notes)",
                other
            ))),
        }
    }
}

/// A single task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, immutable after creation
    pub id: TaskId,

    /// User content, non-empty and trimmed
    pub text: String,

    /// Completion flag; independent between parent and children
    #[serde(default)]
    pub completed: bool,

    /// `None` for main tasks, the owning main task's id for sub-tasks
    #[serde(default)]
    pub parent_id: Option<TaskId>,

    /// Position among siblings sharing the same `parent_id`; dense `0..N-1`
    #[serde(default)]
    pub order: u32,

    /// Milliseconds since epoch
    pub created_at: i64,

    /// Refreshed on text edit, completion toggle and move
    pub updated_at: i64,

    /// Per-task rendering preferences, carried opaquely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_mode: Option<PromptMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,

    /// Unknown fields from imported documents, never silently dropped
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Task {
    /// Creates a new task. Fails when the trimmed text is empty.
    pub fn new(
        id: TaskId,
        text: &str,
        parent_id: Option<TaskId>,
        order: u32,
        now: i64,
    ) -> StoreResult<Self> {
        let text = validate_text(text)?;
        Ok(Self {
            id,
            text,
            completed: false,
            parent_id,
            order,
            created_at: now,
            updated_at: now,
            prompt_mode: None,
            technologies: None,
            notes: None,
            font_size: None,
            extra: HashMap::new(),
        })
    }

    /// Returns true if this is a main task (depth 0)
    pub fn is_main(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Refreshes the update timestamp
    pub(crate) fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }

    /// Merges a partial update shallowly over this task
    pub(crate) fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(mode) = patch.prompt_mode {
            self.prompt_mode = Some(mode);
        }
        if let Some(technologies) = &patch.technologies {
            self.technologies = Some(technologies.clone());
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(font_size) = patch.font_size {
            self.font_size = Some(font_size);
        }
    }
}

/// Validates and trims task text
pub fn validate_text(text: &str) -> StoreResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("task text cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Partial update merged shallowly over a task before its text is written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub completed: Option<bool>,
    pub prompt_mode: Option<PromptMode>,
    pub technologies: Option<Vec<String>>,
    pub notes: Option<String>,
    pub font_size: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.completed.is_none()
            && self.prompt_mode.is_none()
            && self.technologies.is_none()
            && self.notes.is_none()
            && self.font_size.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_task(text: &str) -> Task {
        let now = Utc::now();
        Task::new(TaskId::generate(text, now), text, None, 0, now.timestamp_millis()).unwrap()
    }

    #[test]
    fn new_task_defaults() {
        let task = make_task("buy milk");
        assert_eq!(task.text, "buy milk");
        assert!(!task.completed);
        assert!(task.is_main());
        assert_eq!(task.order, 0);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn new_task_trims_text() {
        let task = make_task("  padded  ");
        assert_eq!(task.text, "padded");
    }

    #[test]
    fn empty_text_is_rejected() {
        let now = Utc::now();
        let result = Task::new(
            TaskId::generate("x", now),
            "   ",
            None,
            0,
            now.timestamp_millis(),
        );
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn patch_merges_shallowly() {
        let mut task = make_task("task");
        task.apply_patch(&TaskPatch {
            completed: Some(true),
            notes: Some("details".to_string()),
            ..TaskPatch::default()
        });

        assert!(task.completed);
        assert_eq!(task.notes.as_deref(), Some("details"));
        // Untouched fields stay untouched
        assert!(task.prompt_mode.is_none());
        assert!(task.font_size.is_none());
    }

    #[test]
    fn serde_uses_camel_case_wire_names() {
        let task = make_task("wire");
        let json = serde_json::to_value(&task).unwrap();

        assert!(json.get("parentId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("parent_id").is_none());
    }

    #[test]
    fn serde_roundtrip_preserves_unknown_fields() {
        let raw = r##"{
            "id": "1712345678901",
            "text": "from another app",
            "completed": false,
            "parentId": null,
            "order": 0,
            "createdAt": 1712345678901,
            "updatedAt": 1712345678901,
            "color": "#ff0000",
            "pinned": true
        }"##;

        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.extra.get("color"), Some(&serde_json::json!("#ff0000")));
        assert_eq!(task.extra.get("pinned"), Some(&serde_json::json!(true)));

        let reserialized = serde_json::to_value(&task).unwrap();
        assert_eq!(reserialized["color"], serde_json::json!("#ff0000"));
        assert_eq!(reserialized["pinned"], serde_json::json!(true));
    }

    #[test]
    fn prompt_mode_parse_and_display() {
        assert_eq!("full-code".parse::<PromptMode>().unwrap(), PromptMode::FullCode);
        assert_eq!("code-changes".parse::<PromptMode>().unwrap(), PromptMode::CodeChanges);
        assert_eq!("notes".parse::<PromptMode>().unwrap(), PromptMode::Notes);
        assert!("other".parse::<PromptMode>().is_err());
        assert_eq!(PromptMode::CodeChanges.to_string(), "code-changes");
    }

    #[test]
    fn prompt_mode_serde_kebab_case() {
        let json = serde_json::to_string(&PromptMode::FullCode).unwrap();
        assert_eq!(json, "\"full-code\"");
    }
}
