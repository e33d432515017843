//! Prompt outline and the external text service seam
//!
//! The deterministic half of prompt generation lives here: collecting
//! incomplete tasks into groups and numbering them. The network half is the
//! [`TextService`] port, injected once at startup and held for the process
//! lifetime; its failures are recoverable and never fatal to the store.

use serde::Serialize;

use super::error::StoreResult;
use super::task::PromptMode;

/// One main task with its sub-task texts, ready for prompt rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGroup {
    pub main: String,
    pub subtasks: Vec<String>,
}

/// Renders groups as a numbered outline:
///
/// ```text
/// 1. main task
///    1.1. sub-task
/// ```
pub fn format_outline(groups: &[TaskGroup]) -> String {
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, group.main));
        for (j, sub) in group.subtasks.iter().enumerate() {
            out.push_str(&format!("   {}.{}. {}\n", i + 1, j + 1, sub));
        }
    }
    out
}

/// External text generation collaborator.
///
/// All calls may fail with `StoreError::ExternalService`; callers surface the
/// failure and keep local drafts intact. By convention an implementation
/// returns the input unchanged for [`PromptMode::Notes`].
pub trait TextService {
    /// Rewrites the text for clarity, preserving its language
    fn improve(&self, text: &str) -> StoreResult<String>;

    /// Generates a coding prompt for a single task's text
    fn generate_prompt(
        &self,
        text: &str,
        mode: PromptMode,
        technologies: &[String],
    ) -> StoreResult<String>;

    /// Generates one prompt covering all given task groups
    fn generate_workspace_prompt(
        &self,
        groups: &[TaskGroup],
        mode: PromptMode,
        technologies: &[String],
    ) -> StoreResult<String>;
}

/// An uncommitted text edit with a version counter.
///
/// Service calls are tagged with the draft version they were requested
/// against. A result arriving after the draft moved on (edited again,
/// discarded, or already committed) no longer matches and is dropped, so a
/// late response can never clobber newer work.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    text: String,
    version: u64,
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            version: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The version to tag an outgoing service request with
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replaces the draft text, invalidating any in-flight service result
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.version += 1;
    }

    /// Applies a service result tagged with `version`. Returns false and
    /// leaves the draft untouched when the tag no longer matches.
    pub fn apply(&mut self, version: u64, text: String) -> bool {
        if version != self.version {
            return false;
        }
        self.text = text;
        self.version += 1;
        true
    }

    /// Runs the improve call synchronously against the current version
    pub fn improve_with(&mut self, service: &dyn TextService) -> StoreResult<bool> {
        let version = self.version;
        let improved = service.improve(&self.text)?;
        Ok(self.apply(version, improved))
    }
}
