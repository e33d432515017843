//! Taskpad - A local-first personal task manager
//!
//! Taskpad keeps a two-level hierarchy of tasks (main tasks and sub-tasks)
//! with explicit per-scope ordering, named workspace snapshots, reusable
//! task templates, and JSON persistence to a key-value blob store.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Board, PromptMode, StoreError, Task, TaskId};
