//! Workspace snapshots
//!
//! A workspace is a named, immutable snapshot of the full task collection at
//! save time. Loading one fully replaces the live collection; there is no
//! merging. Snapshots are deep value copies, so later edits to live tasks
//! never leak into a saved workspace.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use super::id::WorkspaceId;
use super::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub todos: Vec<Task>,
    pub created_at: i64,
}

/// The collection of saved workspaces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSet {
    entries: Vec<Workspace>,
}

impl WorkspaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Workspace>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Workspace] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots the given tasks under a name. The name must not be empty.
    pub fn save(&mut self, name: &str, tasks: &[Task]) -> StoreResult<&Workspace> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation(
                "workspace name cannot be empty".to_string(),
            ));
        }

        let timestamp = Utc::now();
        let workspace = Workspace {
            id: WorkspaceId::generate(name, timestamp),
            name: name.to_string(),
            todos: tasks.to_vec(),
            created_at: timestamp.timestamp_millis(),
        };
        self.entries.push(workspace);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn get(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.entries.iter().find(|w| &w.id == id)
    }

    /// Like [`get`](Self::get) but with a typed failure for absent ids
    pub fn require(&self, id: &WorkspaceId) -> StoreResult<&Workspace> {
        self.get(id)
            .ok_or_else(|| StoreError::NotFound(format!("workspace {} not found", id)))
    }

    /// Removes and returns a workspace. The caller clears its
    /// current-workspace pointer if it referenced the removed one.
    pub fn remove(&mut self, id: &WorkspaceId) -> StoreResult<Workspace> {
        let position = self
            .entries
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("workspace {} not found", id)))?;
        Ok(self.entries.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::Board;

    fn sample_tasks() -> Vec<Task> {
        let mut board = Board::new();
        board.add_task("one", None).unwrap();
        board.add_task("two", None).unwrap();
        board.tasks().to_vec()
    }

    #[test]
    fn save_and_get() {
        let mut set = WorkspaceSet::new();
        let tasks = sample_tasks();

        let id = set.save("sprint 1", &tasks).unwrap().id.clone();

        let loaded = set.require(&id).unwrap();
        assert_eq!(loaded.name, "sprint 1");
        assert_eq!(loaded.todos, tasks);
    }

    #[test]
    fn save_trims_and_rejects_empty_name() {
        let mut set = WorkspaceSet::new();

        assert!(matches!(
            set.save("   ", &[]),
            Err(StoreError::Validation(_))
        ));
        assert!(set.is_empty());

        let ws = set.save("  padded  ", &[]).unwrap();
        assert_eq!(ws.name, "padded");
    }

    #[test]
    fn snapshot_is_immune_to_later_mutations() {
        let mut board = Board::new();
        let task = board.add_task("original", None).unwrap();

        let mut set = WorkspaceSet::new();
        let id = set.save("backup", board.tasks()).unwrap().id.clone();

        board
            .update_task(&task.id, "mutated", &Default::default())
            .unwrap();

        assert_eq!(set.require(&id).unwrap().todos[0].text, "original");
    }

    #[test]
    fn load_replaces_live_collection_verbatim() {
        let mut board = Board::new();
        board.add_task("keep me", None).unwrap();

        let mut set = WorkspaceSet::new();
        let id = set.save("saved", board.tasks()).unwrap().id.clone();

        board.add_task("added later", None).unwrap();
        assert_eq!(board.len(), 2);

        let snapshot = set.require(&id).unwrap().todos.clone();
        board.replace_tasks(snapshot);

        assert_eq!(board.len(), 1);
        assert_eq!(board.tasks()[0].text, "keep me");
    }

    #[test]
    fn remove_absent_fails() {
        let mut set = WorkspaceSet::new();
        let ghost: WorkspaceId = "missing".parse().unwrap();

        assert!(matches!(set.remove(&ghost), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn remove_returns_the_workspace() {
        let mut set = WorkspaceSet::new();
        let id = set.save("gone soon", &[]).unwrap().id.clone();

        let removed = set.remove(&id).unwrap();
        assert_eq!(removed.name, "gone soon");
        assert!(set.get(&id).is_none());
    }
}
