//! # Storage Layer
//!
//! Persistence for Taskpad.
//!
//! ## Layout
//!
//! | Data | Format | Key / location |
//! |------|--------|----------------|
//! | Tasks | JSON array | blob key `todos` |
//! | Workspaces | JSON array | blob key `workspaces` |
//! | Templates | JSON array | blob key `savedTasks` |
//! | Settings | plain strings | blob keys `globalPromptMode`, `globalFontSize`, ... |
//! | Session | JSON / string | blob keys `clipboard`, `selection`, `currentWorkspace` |
//! | CLI config | TOML | `~/.config/taskpad/config.toml` |
//!
//! The blob store keeps one file per key under the data directory. All
//! writes are atomic (temp file + rename) and file-locked, and each key is
//! written synchronously in the same turn as the mutation it reflects, so a
//! stale write can never overtake a newer one.
//!
//! ## Key Types
//!
//! - [`BlobStore`] / [`FileBlobStore`] - the generic key-value store
//! - [`Gateway`] - maps [`AppState`] onto blob keys, export/import document
//! - [`Config`] - CLI-level preferences

mod blob;
mod gateway;
mod config;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use config::{Config, ConfigError, ConfigFormat};
pub use gateway::{
    apply_import, export_document, export_json, keys, AppState, ExportDocument, Gateway,
    ImportSummary, Settings,
};
