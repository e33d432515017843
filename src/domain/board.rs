//! The task board
//!
//! `Board` exclusively owns the task collection. Every mutation routes
//! through its methods, which keep the invariants intact: per-scope order
//! stays dense, sub-tasks always reference an existing main task, and a
//! failed operation leaves the collection exactly as it was.
//!
//! The clipboard slot and the selection set are ephemeral companions of the
//! collection; neither is part of the export document.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::{StoreError, StoreResult};
use super::id::TaskId;
use super::ordering::{self, Scope};
use super::prompt::TaskGroup;
use super::task::{now_millis, validate_text, PromptMode, Task, TaskPatch};

/// Value copy of a task held in the clipboard slot.
///
/// Carries text, completion and rendering preferences but never the source
/// task's id, parent or timestamps; a paste mints all of those fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardTask {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_mode: Option<PromptMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ClipboardTask {
    fn from_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            completed: task.completed,
            prompt_mode: task.prompt_mode,
            technologies: task.technologies.clone(),
            notes: task.notes.clone(),
            font_size: task.font_size,
            extra: task.extra.clone(),
        }
    }
}

/// Derived counts over the collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub main_tasks: usize,
    pub sub_tasks: usize,
    pub created_today: usize,
    pub completed_this_week: usize,
    /// Completed share of all tasks, rounded percent
    pub completion_rate: u32,
    /// Mean `updated_at - created_at` over completed tasks, rounded hours
    pub avg_completion_hours: Option<i64>,
}

/// The aggregate owning all tasks, the clipboard slot and the selection set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    tasks: Vec<Task>,
    clipboard: Option<ClipboardTask>,
    selection: HashSet<TaskId>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from a loaded or imported task list.
    ///
    /// The list is normalized on the way in: sub-tasks whose parent is
    /// missing (or is itself a sub-task) are dropped and every scope is
    /// renumbered densely. For any list produced by this store both steps
    /// are identities.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut board = Self::new();
        board.replace_tasks(tasks);
        board
    }

    /// Installs a new task list wholesale, e.g. when loading a workspace
    /// snapshot or importing a document. Clipboard content survives; the
    /// selection is pruned to ids that still exist.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.normalize();
    }

    fn normalize(&mut self) {
        let main_ids: HashSet<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.is_main())
            .map(|t| t.id.clone())
            .collect();

        self.tasks.retain(|t| match &t.parent_id {
            None => true,
            Some(parent) => main_ids.contains(parent),
        });

        ordering::renumber(&mut self.tasks, &Scope::Root);
        for parent in &main_ids {
            ordering::renumber(&mut self.tasks, &Scope::Children(parent.clone()));
        }

        let existing: HashSet<TaskId> = self.tasks.iter().map(|t| t.id.clone()).collect();
        self.selection.retain(|id| existing.contains(id));
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    fn not_found(id: &TaskId) -> StoreError {
        StoreError::NotFound(format!("task {} not found", id))
    }

    /// Checks that `parent` names an existing main task. The hierarchy is
    /// capped at two levels, so a sub-task id never resolves as a parent.
    fn resolve_parent(&self, parent: &TaskId) -> StoreResult<()> {
        match self.get(parent) {
            Some(task) if task.is_main() => Ok(()),
            Some(_) => Err(StoreError::NotFound(format!(
                "task {} is a sub-task and cannot have sub-tasks of its own",
                parent
            ))),
            None => Err(Self::not_found(parent)),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Appends a new task to the root scope, or to a main task's sub-scope
    pub fn add_task(&mut self, text: &str, parent: Option<&TaskId>) -> StoreResult<Task> {
        let text = validate_text(text)?;
        if let Some(parent) = parent {
            self.resolve_parent(parent)?;
        }

        let timestamp = Utc::now();
        let scope = match parent {
            None => Scope::Root,
            Some(parent) => Scope::Children(parent.clone()),
        };
        let order = ordering::append_position(&self.tasks, &scope);
        let task = Task::new(
            TaskId::generate(&text, timestamp),
            &text,
            parent.cloned(),
            order,
            timestamp.timestamp_millis(),
        )?;

        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Rewrites a task's text, merging an optional partial update first
    pub fn update_task(&mut self, id: &TaskId, text: &str, patch: &TaskPatch) -> StoreResult<Task> {
        let position = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let text = validate_text(text)?;

        let task = &mut self.tasks[position];
        task.apply_patch(patch);
        task.text = text;
        task.touch(now_millis());
        Ok(task.clone())
    }

    /// Flips the completion flag and returns the new value.
    ///
    /// Never cascades: parent and children completion states are independent.
    pub fn toggle_completion(&mut self, id: &TaskId) -> StoreResult<bool> {
        let position = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let task = &mut self.tasks[position];
        task.completed = !task.completed;
        task.touch(now_millis());
        Ok(task.completed)
    }

    /// Deletes a task. Deleting a main task also deletes all of its
    /// sub-tasks in the same commit; the affected scope is renumbered.
    /// Returns the removed tasks, the target first.
    pub fn delete_task(&mut self, id: &TaskId) -> StoreResult<Vec<Task>> {
        let position = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let target = self.tasks.remove(position);
        let scope = Scope::of(&target);
        let is_main = target.is_main();
        let mut removed = vec![target];

        if is_main {
            let mut children = Vec::new();
            self.tasks.retain(|t| {
                if t.parent_id.as_ref() == Some(id) {
                    children.push(t.clone());
                    false
                } else {
                    true
                }
            });
            children.sort_by_key(|t| t.order);
            removed.extend(children);
        }

        ordering::renumber(&mut self.tasks, &scope);
        for task in &removed {
            self.selection.remove(&task.id);
        }
        Ok(removed)
    }

    /// Reorders within one scope. The gesture layer reports both scope ids;
    /// a mismatch is rejected before any index checks since promoting a
    /// sub-task (or demoting a main task) by reordering is not supported.
    /// Returns false for the `from == to` no-op, which must not trigger a
    /// persistence write.
    pub fn move_task(
        &mut self,
        source: &Scope,
        from: usize,
        dest: &Scope,
        to: usize,
    ) -> StoreResult<bool> {
        if source != dest {
            return Err(StoreError::InvalidMove(format!(
                "cannot move a task from {} to {}",
                source, dest
            )));
        }
        ordering::move_within(&mut self.tasks, source, from, to, now_millis())
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Copies a task by value into the clipboard slot, overwriting any
    /// previous content
    pub fn copy_task(&mut self, id: &TaskId) -> StoreResult<ClipboardTask> {
        let task = self.get(id).ok_or_else(|| Self::not_found(id))?;
        let clip = ClipboardTask::from_task(task);
        self.clipboard = Some(clip.clone());
        Ok(clip)
    }

    pub fn clipboard(&self) -> Option<&ClipboardTask> {
        self.clipboard.as_ref()
    }

    /// Restores clipboard content loaded from session state
    pub fn set_clipboard(&mut self, clip: Option<ClipboardTask>) {
        self.clipboard = clip;
    }

    /// Creates a new task from the clipboard value, appended to the target
    /// scope with a fresh id and fresh timestamps
    pub fn paste_task(&mut self, parent: Option<&TaskId>) -> StoreResult<Task> {
        let clip = self.clipboard.clone().ok_or(StoreError::EmptyClipboard)?;
        if let Some(parent) = parent {
            self.resolve_parent(parent)?;
        }

        let timestamp = Utc::now();
        let scope = match parent {
            None => Scope::Root,
            Some(parent) => Scope::Children(parent.clone()),
        };
        let order = ordering::append_position(&self.tasks, &scope);
        let mut task = Task::new(
            TaskId::generate(&clip.text, timestamp),
            &clip.text,
            parent.cloned(),
            order,
            timestamp.timestamp_millis(),
        )?;
        task.completed = clip.completed;
        task.prompt_mode = clip.prompt_mode;
        task.technologies = clip.technologies.clone();
        task.notes = clip.notes.clone();
        task.font_size = clip.font_size;
        task.extra = clip.extra.clone();

        self.tasks.push(task.clone());
        Ok(task)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selection(&self) -> &HashSet<TaskId> {
        &self.selection
    }

    /// Adds or removes a task from the selection; returns the new membership
    pub fn toggle_selected(&mut self, id: &TaskId) -> StoreResult<bool> {
        if self.get(id).is_none() {
            return Err(Self::not_found(id));
        }
        if self.selection.remove(id) {
            Ok(false)
        } else {
            self.selection.insert(id.clone());
            Ok(true)
        }
    }

    /// Selects every task, main and sub alike
    pub fn select_all(&mut self) {
        self.selection = self.tasks.iter().map(|t| t.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Restores a selection loaded from session state, keeping only ids
    /// that still exist
    pub fn restore_selection(&mut self, ids: impl IntoIterator<Item = TaskId>) {
        self.selection = ids
            .into_iter()
            .filter(|id| self.get(id).is_some())
            .collect();
    }

    // =========================================================================
    // Text renderings
    // =========================================================================

    fn render_blocks<'a, F>(&self, mains: impl Iterator<Item = &'a Task>, include_sub: F) -> String
    where
        F: Fn(&Task) -> bool,
    {
        let blocks: Vec<String> = mains
            .map(|main| {
                let mut block = format!("\u{25cb} {}", main.text);
                for sub in self.subtasks_of(&main.id) {
                    if include_sub(sub) {
                        block.push_str(&format!("\n  \u{25cb} {}", sub.text));
                    }
                }
                block
            })
            .collect();
        blocks.join("\n")
    }

    /// Renders every incomplete main task with its incomplete sub-tasks.
    /// A main task appears regardless of its sub-tasks' completion; a
    /// sub-task appears only when it is itself incomplete. Does not mutate.
    pub fn copy_all_incomplete(&self) -> String {
        let mains = self.main_tasks().into_iter().filter(|t| !t.completed);
        let mains: Vec<&Task> = mains.collect();
        self.render_blocks(mains.into_iter(), |sub| !sub.completed)
    }

    /// Renders the selected main tasks, each with its selected sub-tasks,
    /// then clears the selection. Fails when nothing is selected.
    pub fn copy_selected(&mut self) -> StoreResult<String> {
        if self.selection.is_empty() {
            return Err(StoreError::EmptySelection);
        }
        let mains: Vec<&Task> = self
            .main_tasks()
            .into_iter()
            .filter(|t| self.selection.contains(&t.id))
            .collect();
        let text = self.render_blocks(mains.into_iter(), |sub| self.selection.contains(&sub.id));
        self.selection.clear();
        Ok(text)
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// Main tasks sorted by order
    pub fn main_tasks(&self) -> Vec<&Task> {
        let mut mains: Vec<&Task> = self.tasks.iter().filter(|t| t.is_main()).collect();
        mains.sort_by_key(|t| t.order);
        mains
    }

    /// Sub-tasks of a main task, sorted by order
    pub fn subtasks_of(&self, parent: &TaskId) -> Vec<&Task> {
        let mut subs: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.parent_id.as_ref() == Some(parent))
            .collect();
        subs.sort_by_key(|t| t.order);
        subs
    }

    pub fn visible_main_tasks(&self, hide_completed: bool) -> Vec<&Task> {
        self.main_tasks()
            .into_iter()
            .filter(|t| !hide_completed || !t.completed)
            .collect()
    }

    pub fn visible_subtasks_of(&self, parent: &TaskId, hide_completed: bool) -> Vec<&Task> {
        self.subtasks_of(parent)
            .into_iter()
            .filter(|t| !hide_completed || !t.completed)
            .collect()
    }

    /// Incomplete main tasks with their incomplete sub-tasks, for prompt
    /// outline generation
    pub fn incomplete_outline(&self) -> Vec<TaskGroup> {
        self.main_tasks()
            .into_iter()
            .filter(|t| !t.completed)
            .map(|main| TaskGroup {
                main: main.text.clone(),
                subtasks: self
                    .subtasks_of(&main.id)
                    .into_iter()
                    .filter(|s| !s.completed)
                    .map(|s| s.text.clone())
                    .collect(),
            })
            .collect()
    }

    /// Derived counts; `now` is the caller's logical clock in milliseconds
    pub fn stats(&self, now: i64) -> BoardStats {
        const DAY_MS: i64 = 86_400_000;
        let today_start = now - now.rem_euclid(DAY_MS);
        let week_ago = now - 7 * DAY_MS;

        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        let completed_durations: Vec<i64> = self
            .tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.updated_at - t.created_at)
            .collect();

        let avg_completion_hours = if completed_durations.is_empty() {
            None
        } else {
            let mean = completed_durations.iter().sum::<i64>() as f64
                / completed_durations.len() as f64;
            Some((mean / 3_600_000.0).round() as i64)
        };

        BoardStats {
            total,
            completed,
            pending: total - completed,
            main_tasks: self.tasks.iter().filter(|t| t.is_main()).count(),
            sub_tasks: self.tasks.iter().filter(|t| !t.is_main()).count(),
            created_today: self.tasks.iter().filter(|t| t.created_at >= today_start).count(),
            completed_this_week: self
                .tasks
                .iter()
                .filter(|t| t.completed && t.updated_at >= week_ago)
                .count(),
            completion_rate: if total == 0 {
                0
            } else {
                ((completed as f64 / total as f64) * 100.0).round() as u32
            },
            avg_completion_hours,
        }
    }
}
