//! Saved-task templates
//!
//! Templates are reusable text snippets independent of any task instance.
//! Text is effectively unique within the collection: re-saving existing text
//! is a no-op that surfaces as "already exists". Every time a template's
//! text is consumed into a task its usage count goes up, which ranks it
//! higher in suggestions.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use super::id::TemplateId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTask {
    pub id: TemplateId,
    pub text: String,
    pub usage_count: u32,
}

/// Outcome of saving a template
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(TemplateId),
    AlreadyExists,
}

/// The collection of saved-task templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    entries: Vec<SavedTask>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<SavedTask>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SavedTask] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Saves a text as a template. Existing text is left untouched and
    /// reported back as [`SaveOutcome::AlreadyExists`].
    pub fn save(&mut self, text: &str) -> StoreResult<SaveOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Validation(
                "template text cannot be empty".to_string(),
            ));
        }
        if self.entries.iter().any(|t| t.text == text) {
            return Ok(SaveOutcome::AlreadyExists);
        }

        let timestamp = Utc::now();
        let id = TemplateId::generate(text, timestamp);
        self.entries.push(SavedTask {
            id: id.clone(),
            text: text.to_string(),
            usage_count: 1,
        });
        Ok(SaveOutcome::Saved(id))
    }

    /// Records that a template's text was consumed into a task
    pub fn record_use(&mut self, text: &str) -> bool {
        for template in &mut self.entries {
            if template.text == text {
                template.usage_count += 1;
                return true;
            }
        }
        false
    }

    pub fn remove(&mut self, id: &TemplateId) -> StoreResult<SavedTask> {
        let position = self
            .entries
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("template {} not found", id)))?;
        Ok(self.entries.remove(position))
    }

    /// Templates matching the query: case-insensitive substring match,
    /// exact matches excluded, most-used first, capped at `limit`
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<&SavedTask> {
        let needle = query.to_lowercase();
        let mut matches: Vec<&SavedTask> = self
            .entries
            .iter()
            .filter(|t| t.text.to_lowercase().contains(&needle) && t.text != query)
            .collect();
        matches.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        matches.truncate(limit);
        matches
    }
}
