//! Property tests for the store invariants
//!
//! After any sequence of add/move/delete/toggle operations, every scope's
//! `order` values must be a dense permutation of `0..N-1`, and the export
//! document must round-trip the full state exactly.

use proptest::prelude::*;

use taskpad_cli::domain::{Scope, TaskId};
use taskpad_cli::storage::{apply_import, export_json, AppState};
use taskpad_cli::Board;

/// A random store operation, resolved against the live board by index so
/// generated sequences stay valid regardless of what ran before
#[derive(Debug, Clone)]
enum Op {
    AddMain(String),
    AddSub { parent: usize, text: String },
    Toggle(usize),
    Delete(usize),
    Move { scope_of: usize, from: usize, to: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let text = "[a-z]{1,8}";
    prop_oneof![
        text.prop_map(Op::AddMain),
        (any::<prop::sample::Index>(), text.prop_map(String::from)).prop_map(|(parent, text)| {
            Op::AddSub {
                parent: parent.index(64),
                text,
            }
        }),
        any::<prop::sample::Index>().prop_map(|i| Op::Toggle(i.index(64))),
        any::<prop::sample::Index>().prop_map(|i| Op::Delete(i.index(64))),
        (
            any::<prop::sample::Index>(),
            any::<prop::sample::Index>(),
            any::<prop::sample::Index>()
        )
            .prop_map(|(s, f, t)| Op::Move {
                scope_of: s.index(64),
                from: f.index(8),
                to: t.index(8),
            }),
    ]
}

fn nth_id(board: &Board, n: usize) -> Option<TaskId> {
    board.tasks().get(n % board.len().max(1)).map(|t| t.id.clone())
}

fn nth_main_id(board: &Board, n: usize) -> Option<TaskId> {
    let mains = board.main_tasks();
    if mains.is_empty() {
        return None;
    }
    Some(mains[n % mains.len()].id.clone())
}

/// Applies an op, ignoring rejections: failed operations must leave the
/// board untouched, which the density check below would catch if violated
fn apply(board: &mut Board, op: &Op) {
    match op {
        Op::AddMain(text) => {
            let _ = board.add_task(text, None);
        }
        Op::AddSub { parent, text } => {
            if let Some(parent) = nth_main_id(board, *parent) {
                let _ = board.add_task(text, Some(&parent));
            }
        }
        Op::Toggle(n) => {
            if let Some(id) = nth_id(board, *n) {
                let _ = board.toggle_completion(&id);
            }
        }
        Op::Delete(n) => {
            if let Some(id) = nth_id(board, *n) {
                let _ = board.delete_task(&id);
            }
        }
        Op::Move { scope_of, from, to } => {
            let scope = match nth_id(board, *scope_of) {
                Some(id) => board
                    .get(&id)
                    .map(|t| Scope::of(t))
                    .unwrap_or(Scope::Root),
                None => Scope::Root,
            };
            let _ = board.move_task(&scope, *from, &scope, *to);
        }
    }
}

/// Every scope's orders are exactly 0..N-1
fn assert_dense_everywhere(board: &Board) {
    let mut scopes = vec![Scope::Root];
    for main in board.main_tasks() {
        scopes.push(Scope::Children(main.id.clone()));
    }

    for scope in scopes {
        let mut orders: Vec<u32> = board
            .tasks()
            .iter()
            .filter(|t| scope.contains(t))
            .map(|t| t.order)
            .collect();
        orders.sort_unstable();
        let expected: Vec<u32> = (0..orders.len() as u32).collect();
        assert_eq!(orders, expected, "orders not dense in scope {}", scope);
    }
}

/// No sub-task references a missing or non-main parent
fn assert_no_orphans(board: &Board) {
    for task in board.tasks() {
        if let Some(parent) = &task.parent_id {
            let parent = board.get(parent).expect("orphan sub-task");
            assert!(parent.is_main(), "sub-task parented to a sub-task");
        }
    }
}

proptest! {
    #[test]
    fn order_stays_dense_under_any_op_sequence(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut board = Board::new();
        for op in &ops {
            apply(&mut board, op);
            assert_dense_everywhere(&board);
        }
        assert_no_orphans(&board);
    }

    #[test]
    fn export_import_roundtrips_any_reachable_state(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut board = Board::new();
        for op in &ops {
            apply(&mut board, op);
        }

        let mut state = AppState::default();
        state.board = board;
        state.workspaces.save("snapshot", state.board.tasks()).ok();
        state.templates.save("template text").ok();

        let json = export_json(&state, chrono::Utc::now());
        let mut restored = AppState::default();
        apply_import(&mut restored, &json).unwrap();

        prop_assert_eq!(restored.board.tasks(), state.board.tasks());
        prop_assert_eq!(restored.workspaces, state.workspaces);
        prop_assert_eq!(restored.templates, state.templates);
        prop_assert_eq!(restored.settings, state.settings);
    }
}
