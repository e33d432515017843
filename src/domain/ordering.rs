//! Ordering engine
//!
//! Keeps the `order` field dense within each sibling scope: after every
//! structural change, sorting a scope's tasks by `order` yields exactly
//! `0..N-1` with no gaps or duplicates. Moves are scope-local; the board
//! rejects cross-scope moves before they reach this module.

use std::fmt;

use super::error::{StoreError, StoreResult};
use super::id::TaskId;
use super::task::Task;

/// A sibling scope: the root scope or the sub-task scope of one main task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Root,
    Children(TaskId),
}

impl Scope {
    /// Returns the scope the given task belongs to
    pub fn of(task: &Task) -> Self {
        match &task.parent_id {
            None => Scope::Root,
            Some(parent) => Scope::Children(parent.clone()),
        }
    }

    /// Returns true if the task is a member of this scope
    pub fn contains(&self, task: &Task) -> bool {
        match self {
            Scope::Root => task.parent_id.is_none(),
            Scope::Children(parent) => task.parent_id.as_ref() == Some(parent),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Root => f.write_str("root"),
            Scope::Children(parent) => write!(f, "sub-tasks of {}", parent),
        }
    }
}

/// Indices of the scope's members, sorted by their current `order`
fn member_indices(tasks: &[Task], scope: &Scope) -> Vec<usize> {
    let mut members: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| scope.contains(t))
        .map(|(i, _)| i)
        .collect();
    members.sort_by_key(|&i| tasks[i].order);
    members
}

/// Returns the order value for a task appended to the scope
pub fn append_position(tasks: &[Task], scope: &Scope) -> u32 {
    tasks.iter().filter(|t| scope.contains(t)).count() as u32
}

/// Re-derives `order = index` for every member of the scope.
///
/// Used after inserts and deletes; does not refresh `updated_at`.
pub fn renumber(tasks: &mut [Task], scope: &Scope) {
    let members = member_indices(tasks, scope);
    for (position, &index) in members.iter().enumerate() {
        tasks[index].order = position as u32;
    }
}

/// Moves the member at `from` to `to` within the scope and renumbers.
///
/// Returns `Ok(false)` without mutating anything when `from == to`, so the
/// caller can skip the persistence write. Every element whose order changed
/// gets its `updated_at` refreshed.
pub fn move_within(
    tasks: &mut [Task],
    scope: &Scope,
    from: usize,
    to: usize,
    now: i64,
) -> StoreResult<bool> {
    let mut members = member_indices(tasks, scope);
    let len = members.len();

    if from >= len || to >= len {
        return Err(StoreError::InvalidMove(format!(
            "index {} -> {} out of range for {} ({} tasks)",
            from, to, scope, len
        )));
    }

    if from == to {
        return Ok(false);
    }

    let moved = members.remove(from);
    members.insert(to, moved);

    for (position, &index) in members.iter().enumerate() {
        let position = position as u32;
        if tasks[index].order != position {
            tasks[index].order = position;
            tasks[index].touch(now);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::now_millis;
    use chrono::Utc;

    fn make_task(text: &str, parent: Option<&TaskId>, order: u32) -> Task {
        let now = Utc::now();
        Task::new(
            TaskId::generate(text, now),
            text,
            parent.cloned(),
            order,
            now.timestamp_millis(),
        )
        .unwrap()
    }

    fn root_fixture(n: u32) -> Vec<Task> {
        (0..n).map(|i| make_task(&format!("task {}", i), None, i)).collect()
    }

    fn ordered_texts(tasks: &[Task], scope: &Scope) -> Vec<String> {
        let mut members: Vec<&Task> = tasks.iter().filter(|t| scope.contains(t)).collect();
        members.sort_by_key(|t| t.order);
        members.iter().map(|t| t.text.clone()).collect()
    }

    fn assert_dense(tasks: &[Task], scope: &Scope) {
        let mut orders: Vec<u32> = tasks
            .iter()
            .filter(|t| scope.contains(t))
            .map(|t| t.order)
            .collect();
        orders.sort_unstable();
        let expected: Vec<u32> = (0..orders.len() as u32).collect();
        assert_eq!(orders, expected);
    }

    #[test]
    fn append_position_counts_scope_members_only() {
        let mut tasks = root_fixture(2);
        let parent = tasks[0].id.clone();
        tasks.push(make_task("sub", Some(&parent), 0));

        assert_eq!(append_position(&tasks, &Scope::Root), 2);
        assert_eq!(append_position(&tasks, &Scope::Children(parent)), 1);
    }

    #[test]
    fn renumber_closes_gaps() {
        let mut tasks = root_fixture(3);
        tasks[1].order = 7;
        tasks[2].order = 3;

        renumber(&mut tasks, &Scope::Root);

        assert_dense(&tasks, &Scope::Root);
        assert_eq!(ordered_texts(&tasks, &Scope::Root), vec!["task 0", "task 2", "task 1"]);
    }

    #[test]
    fn move_first_to_last() {
        let mut tasks = root_fixture(3);

        let changed = move_within(&mut tasks, &Scope::Root, 0, 2, now_millis()).unwrap();

        assert!(changed);
        assert_eq!(ordered_texts(&tasks, &Scope::Root), vec!["task 1", "task 2", "task 0"]);
        assert_dense(&tasks, &Scope::Root);
    }

    #[test]
    fn move_refreshes_updated_at_of_shifted_elements() {
        let mut tasks = root_fixture(3);
        let before: Vec<i64> = tasks.iter().map(|t| t.updated_at).collect();
        let later = before[0] + 1000;

        move_within(&mut tasks, &Scope::Root, 0, 2, later).unwrap();

        // All three elements changed position, so all three were touched
        for task in &tasks {
            assert_eq!(task.updated_at, later);
        }
    }

    #[test]
    fn noop_move_leaves_everything_untouched() {
        let mut tasks = root_fixture(3);
        let snapshot = tasks.clone();
        let later = now_millis() + 1000;

        let changed = move_within(&mut tasks, &Scope::Root, 1, 1, later).unwrap();

        assert!(!changed);
        assert_eq!(tasks, snapshot);
    }

    #[test]
    fn out_of_range_move_is_rejected() {
        let mut tasks = root_fixture(2);
        let snapshot = tasks.clone();

        let result = move_within(&mut tasks, &Scope::Root, 0, 5, now_millis());

        assert!(matches!(result, Err(StoreError::InvalidMove(_))));
        assert_eq!(tasks, snapshot);
    }

    #[test]
    fn move_in_sub_scope_does_not_disturb_root() {
        let mut tasks = root_fixture(2);
        let parent = tasks[0].id.clone();
        tasks.push(make_task("sub a", Some(&parent), 0));
        tasks.push(make_task("sub b", Some(&parent), 1));

        let scope = Scope::Children(parent);
        move_within(&mut tasks, &scope, 0, 1, now_millis()).unwrap();

        assert_eq!(ordered_texts(&tasks, &scope), vec!["sub b", "sub a"]);
        assert_eq!(ordered_texts(&tasks, &Scope::Root), vec!["task 0", "task 1"]);
        assert_dense(&tasks, &scope);
        assert_dense(&tasks, &Scope::Root);
    }
}
