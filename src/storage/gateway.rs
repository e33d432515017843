//! Persistence gateway
//!
//! Maps the in-memory state onto blob-store keys and defines the
//! export/import document. Every key is read independently at startup
//! (missing key means built-in default) and written independently when its
//! value changes. Scalar settings are stored in their original string forms
//! (`"14"`, `"1.8"`, `"true"`, `"full-code"`) and validated on load rather
//! than trusted.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Board, ClipboardTask, PromptMode, SavedTask, StoreError, StoreResult, Task, TaskId,
    TemplateSet, Workspace, WorkspaceId, WorkspaceSet,
};

use super::blob::BlobStore;

/// Blob-store keys. The first eight form the persisted surface of the
/// export document; the session keys let clipboard, selection and the
/// current-workspace pointer span CLI invocations.
pub mod keys {
    pub const TODOS: &str = "todos";
    pub const WORKSPACES: &str = "workspaces";
    pub const SAVED_TASKS: &str = "savedTasks";
    pub const GLOBAL_PROMPT_MODE: &str = "globalPromptMode";
    pub const GLOBAL_FONT_SIZE: &str = "globalFontSize";
    pub const GLOBAL_LINE_HEIGHT: &str = "globalLineHeight";
    pub const SHOW_HEADER: &str = "showHeader";
    pub const SHOW_TOOLBAR: &str = "showToolbar";

    pub const CLIPBOARD: &str = "clipboard";
    pub const SELECTION: &str = "selection";
    pub const CURRENT_WORKSPACE: &str = "currentWorkspace";
}

/// Global display and prompt settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub global_prompt_mode: PromptMode,
    pub global_font_size: u32,
    pub global_line_height: f64,
    pub show_header: bool,
    pub show_toolbar: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_prompt_mode: PromptMode::FullCode,
            global_font_size: 14,
            global_line_height: 1.8,
            show_header: true,
            show_toolbar: true,
        }
    }
}

/// The full in-memory state the gateway loads and persists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub board: Board,
    pub workspaces: WorkspaceSet,
    pub templates: TemplateSet,
    pub settings: Settings,
    pub current_workspace: Option<WorkspaceId>,
}

/// The export document written by `export` and read by `import`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub todos: Vec<Task>,
    pub workspaces: Vec<Workspace>,
    pub saved_tasks: Vec<SavedTask>,
    pub settings: Settings,
    pub export_date: DateTime<Utc>,
}

/// Import view of the document: every top-level key is optional, unknown
/// keys (like `exportDate`) are ignored
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    todos: Option<Vec<Task>>,
    workspaces: Option<Vec<Workspace>>,
    saved_tasks: Option<Vec<SavedTask>>,
    settings: Option<Settings>,
}

/// Which collections an import replaced, with their new sizes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub todos: Option<usize>,
    pub workspaces: Option<usize>,
    pub saved_tasks: Option<usize>,
    pub settings: bool,
}

/// Builds the export document from the current state
pub fn export_document(state: &AppState, export_date: DateTime<Utc>) -> ExportDocument {
    ExportDocument {
        todos: state.board.tasks().to_vec(),
        workspaces: state.workspaces.entries().to_vec(),
        saved_tasks: state.templates.entries().to_vec(),
        settings: state.settings.clone(),
        export_date,
    }
}

/// Serializes the current state as a pretty-printed export document
pub fn export_json(state: &AppState, export_date: DateTime<Utc>) -> String {
    // ExportDocument contains no map keys that can fail to serialize
    serde_json::to_string_pretty(&export_document(state, export_date))
        .unwrap_or_else(|_| String::from("{}"))
}

/// Applies an import document to the state: each present top-level key fully
/// replaces the corresponding collection, absent keys leave state untouched.
/// Malformed input fails with `MalformedData` before anything is mutated.
pub fn apply_import(state: &mut AppState, raw: &str) -> StoreResult<ImportSummary> {
    let doc: ImportDocument = serde_json::from_str(raw)
        .map_err(|e| StoreError::MalformedData(e.to_string()))?;

    let mut summary = ImportSummary::default();

    if let Some(todos) = doc.todos {
        state.board.replace_tasks(todos);
        summary.todos = Some(state.board.len());
    }
    if let Some(workspaces) = doc.workspaces {
        state.workspaces = WorkspaceSet::from_entries(workspaces);
        summary.workspaces = Some(state.workspaces.len());
        // The pointer may now dangle
        if let Some(current) = &state.current_workspace {
            if state.workspaces.get(current).is_none() {
                state.current_workspace = None;
            }
        }
    }
    if let Some(saved_tasks) = doc.saved_tasks {
        state.templates = TemplateSet::from_entries(saved_tasks);
        summary.saved_tasks = Some(state.templates.len());
    }
    if let Some(settings) = doc.settings {
        state.settings = settings;
        summary.settings = true;
    }

    Ok(summary)
}

/// Reads and writes app state through a blob store
pub struct Gateway<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> Gateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            None => Ok(None),
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|e| {
                    StoreError::MalformedData(format!("stored key '{}': {}", key, e))
                })?;
                Ok(Some(value))
            }
        }
    }

    /// Loads the full state, reading each key independently. A missing key
    /// yields its built-in default; an unreadable one is an error.
    pub fn load(&self) -> Result<AppState> {
        let tasks: Vec<Task> = self.read_json(keys::TODOS)?.unwrap_or_default();
        let mut board = Board::from_tasks(tasks);

        if let Some(clip) = self.read_json::<ClipboardTask>(keys::CLIPBOARD)? {
            board.set_clipboard(Some(clip));
        }
        if let Some(selection) = self.read_json::<Vec<TaskId>>(keys::SELECTION)? {
            board.restore_selection(selection);
        }

        let workspaces =
            WorkspaceSet::from_entries(self.read_json(keys::WORKSPACES)?.unwrap_or_default());
        let templates =
            TemplateSet::from_entries(self.read_json(keys::SAVED_TASKS)?.unwrap_or_default());

        let current_workspace = match self.store.get(keys::CURRENT_WORKSPACE)? {
            Some(raw) => {
                let id: WorkspaceId = raw
                    .parse()
                    .map_err(|e: StoreError| StoreError::MalformedData(e.to_string()))?;
                // Prune a pointer to a workspace that no longer exists
                workspaces.get(&id).map(|w| w.id.clone())
            }
            None => None,
        };

        let settings = self.load_settings()?;

        Ok(AppState {
            board,
            workspaces,
            templates,
            settings,
            current_workspace,
        })
    }

    fn load_settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(raw) = self.store.get(keys::GLOBAL_PROMPT_MODE)? {
            settings.global_prompt_mode = raw.parse().map_err(|_: StoreError| {
                StoreError::MalformedData(format!("stored key 'globalPromptMode': '{}'", raw))
            })?;
        }
        if let Some(raw) = self.store.get(keys::GLOBAL_FONT_SIZE)? {
            settings.global_font_size = raw.parse().map_err(|_| {
                StoreError::MalformedData(format!("stored key 'globalFontSize': '{}'", raw))
            })?;
        }
        if let Some(raw) = self.store.get(keys::GLOBAL_LINE_HEIGHT)? {
            settings.global_line_height = raw.parse().map_err(|_| {
                StoreError::MalformedData(format!("stored key 'globalLineHeight': '{}'", raw))
            })?;
        }
        if let Some(raw) = self.store.get(keys::SHOW_HEADER)? {
            settings.show_header = parse_bool(keys::SHOW_HEADER, &raw)?;
        }
        if let Some(raw) = self.store.get(keys::SHOW_TOOLBAR)? {
            settings.show_toolbar = parse_bool(keys::SHOW_TOOLBAR, &raw)?;
        }

        Ok(settings)
    }

    // =========================================================================
    // Per-key writes, each issued synchronously when its value changes
    // =========================================================================

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks)
            .map_err(|e| StoreError::MalformedData(e.to_string()))?;
        self.store.put(keys::TODOS, &json)
    }

    pub fn save_workspaces(&self, workspaces: &WorkspaceSet) -> Result<()> {
        let json = serde_json::to_string(workspaces.entries())
            .map_err(|e| StoreError::MalformedData(e.to_string()))?;
        self.store.put(keys::WORKSPACES, &json)
    }

    pub fn save_templates(&self, templates: &TemplateSet) -> Result<()> {
        let json = serde_json::to_string(templates.entries())
            .map_err(|e| StoreError::MalformedData(e.to_string()))?;
        self.store.put(keys::SAVED_TASKS, &json)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.store.put(
            keys::GLOBAL_PROMPT_MODE,
            settings.global_prompt_mode.as_str(),
        )?;
        self.store
            .put(keys::GLOBAL_FONT_SIZE, &settings.global_font_size.to_string())?;
        self.store.put(
            keys::GLOBAL_LINE_HEIGHT,
            &settings.global_line_height.to_string(),
        )?;
        self.store
            .put(keys::SHOW_HEADER, &settings.show_header.to_string())?;
        self.store
            .put(keys::SHOW_TOOLBAR, &settings.show_toolbar.to_string())?;
        Ok(())
    }

    pub fn save_clipboard(&self, clipboard: Option<&ClipboardTask>) -> Result<()> {
        match clipboard {
            None => self.store.remove(keys::CLIPBOARD),
            Some(clip) => {
                let json = serde_json::to_string(clip)
                    .map_err(|e| StoreError::MalformedData(e.to_string()))?;
                self.store.put(keys::CLIPBOARD, &json)
            }
        }
    }

    pub fn save_selection(&self, selection: &HashSet<TaskId>) -> Result<()> {
        let mut ids: Vec<&TaskId> = selection.iter().collect();
        ids.sort();
        let json = serde_json::to_string(&ids)
            .map_err(|e| StoreError::MalformedData(e.to_string()))?;
        self.store.put(keys::SELECTION, &json)
    }

    pub fn save_current_workspace(&self, current: Option<&WorkspaceId>) -> Result<()> {
        match current {
            None => self.store.remove(keys::CURRENT_WORKSPACE),
            Some(id) => self.store.put(keys::CURRENT_WORKSPACE, id.as_str()),
        }
    }

    /// Persists the board and its session companions in one go
    pub fn save_board(&self, board: &Board) -> Result<()> {
        self.save_tasks(board.tasks())?;
        self.save_clipboard(board.clipboard())?;
        self.save_selection(board.selection())
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, StoreError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(StoreError::MalformedData(format!(
            "stored key '{}': '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::MemoryBlobStore;

    fn gateway() -> Gateway<MemoryBlobStore> {
        Gateway::new(MemoryBlobStore::new())
    }

    fn sample_state() -> AppState {
        let mut state = AppState::default();
        let a = state.board.add_task("main a", None).unwrap();
        state.board.add_task("sub a1", Some(&a.id)).unwrap();
        let b = state.board.add_task("main b", None).unwrap();
        state.board.toggle_completion(&b.id).unwrap();
        state.workspaces.save("snapshot", state.board.tasks()).unwrap();
        state.templates.save("recurring chore").unwrap();
        state.settings.global_font_size = 18;
        state
    }

    #[test]
    fn load_from_empty_store_yields_defaults() {
        let state = gateway().load().unwrap();

        assert!(state.board.is_empty());
        assert!(state.workspaces.is_empty());
        assert!(state.templates.is_empty());
        assert_eq!(state.settings, Settings::default());
        assert!(state.current_workspace.is_none());
    }

    #[test]
    fn board_roundtrip_through_store() {
        let gw = gateway();
        let state = sample_state();

        gw.save_board(&state.board).unwrap();
        gw.save_workspaces(&state.workspaces).unwrap();
        gw.save_templates(&state.templates).unwrap();
        gw.save_settings(&state.settings).unwrap();

        let loaded = gw.load().unwrap();

        assert_eq!(loaded.board.tasks(), state.board.tasks());
        assert_eq!(loaded.workspaces, state.workspaces);
        assert_eq!(loaded.templates, state.templates);
        assert_eq!(loaded.settings, state.settings);
    }

    #[test]
    fn settings_are_stored_as_plain_strings() {
        let gw = gateway();
        let mut settings = Settings::default();
        settings.global_prompt_mode = PromptMode::Notes;
        settings.global_font_size = 16;
        settings.show_toolbar = false;

        gw.save_settings(&settings).unwrap();

        let store = gw.store();
        assert_eq!(
            store.get(keys::GLOBAL_PROMPT_MODE).unwrap().as_deref(),
            Some("notes")
        );
        assert_eq!(
            store.get(keys::GLOBAL_FONT_SIZE).unwrap().as_deref(),
            Some("16")
        );
        assert_eq!(
            store.get(keys::GLOBAL_LINE_HEIGHT).unwrap().as_deref(),
            Some("1.8")
        );
        assert_eq!(store.get(keys::SHOW_HEADER).unwrap().as_deref(), Some("true"));
        assert_eq!(
            store.get(keys::SHOW_TOOLBAR).unwrap().as_deref(),
            Some("false")
        );
    }

    #[test]
    fn each_settings_key_loads_independently() {
        let gw = gateway();
        // Only one key present; the rest fall back to defaults
        gw.store().put(keys::GLOBAL_FONT_SIZE, "20").unwrap();

        let state = gw.load().unwrap();

        assert_eq!(state.settings.global_font_size, 20);
        assert_eq!(state.settings.global_prompt_mode, PromptMode::FullCode);
        assert!(state.settings.show_header);
    }

    #[test]
    fn corrupt_settings_key_is_malformed_data() {
        let gw = gateway();
        gw.store().put(keys::GLOBAL_FONT_SIZE, "not a number").unwrap();

        let err = gw.load().unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());
    }

    #[test]
    fn corrupt_todos_key_is_malformed_data() {
        let gw = gateway();
        gw.store().put(keys::TODOS, "not json").unwrap();

        let err = gw.load().unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert!(matches!(store_err, StoreError::MalformedData(_)));
    }

    #[test]
    fn clipboard_and_selection_survive_reload() {
        let gw = gateway();
        let mut state = sample_state();
        let id = state.board.main_tasks()[0].id.clone();
        state.board.copy_task(&id).unwrap();
        state.board.toggle_selected(&id).unwrap();

        gw.save_board(&state.board).unwrap();
        let loaded = gw.load().unwrap();

        assert_eq!(loaded.board.clipboard(), state.board.clipboard());
        assert_eq!(loaded.board.selection(), state.board.selection());
    }

    #[test]
    fn dangling_current_workspace_pointer_is_pruned() {
        let gw = gateway();
        gw.store().put(keys::CURRENT_WORKSPACE, "gone").unwrap();

        let state = gw.load().unwrap();
        assert!(state.current_workspace.is_none());
    }

    #[test]
    fn export_import_roundtrip() {
        let state = sample_state();

        let json = export_json(&state, Utc::now());
        let mut restored = AppState::default();
        let summary = apply_import(&mut restored, &json).unwrap();

        assert_eq!(summary.todos, Some(state.board.len()));
        assert_eq!(restored.board.tasks(), state.board.tasks());
        assert_eq!(restored.workspaces, state.workspaces);
        assert_eq!(restored.templates, state.templates);
        assert_eq!(restored.settings, state.settings);
    }

    #[test]
    fn export_document_has_camel_case_keys() {
        let state = sample_state();
        let json = export_json(&state, Utc::now());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("todos").is_some());
        assert!(value.get("savedTasks").is_some());
        assert!(value.get("exportDate").is_some());
        assert!(value["settings"].get("globalPromptMode").is_some());
        assert!(value["todos"][0].get("parentId").is_some());
    }

    #[test]
    fn import_of_garbage_leaves_state_untouched() {
        let mut state = sample_state();
        let snapshot = state.clone();

        let err = apply_import(&mut state, "not json").unwrap_err();

        assert!(matches!(err, StoreError::MalformedData(_)));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn import_of_non_object_root_fails() {
        let mut state = AppState::default();
        assert!(matches!(
            apply_import(&mut state, "[1, 2, 3]"),
            Err(StoreError::MalformedData(_))
        ));
    }

    #[test]
    fn import_replaces_only_present_keys() {
        let mut state = sample_state();
        let original_templates = state.templates.clone();

        let summary = apply_import(&mut state, r#"{"todos": []}"#).unwrap();

        assert_eq!(summary.todos, Some(0));
        assert!(summary.saved_tasks.is_none());
        assert!(state.board.is_empty());
        // Absent keys leave current state untouched
        assert_eq!(state.templates, original_templates);
        assert!(!state.workspaces.is_empty());
    }

    #[test]
    fn import_preserves_unknown_task_fields() {
        let mut state = AppState::default();
        let raw = r#"{"todos": [{
            "id": "1712345678901",
            "text": "imported",
            "completed": false,
            "parentId": null,
            "order": 0,
            "createdAt": 1712345678901,
            "updatedAt": 1712345678901,
            "starred": true
        }]}"#;

        apply_import(&mut state, raw).unwrap();
        let json = export_json(&state, Utc::now());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["todos"][0]["starred"], serde_json::json!(true));
    }

    #[test]
    fn import_prunes_dangling_workspace_pointer() {
        let mut state = sample_state();
        let id = state.workspaces.entries()[0].id.clone();
        state.current_workspace = Some(id);

        apply_import(&mut state, r#"{"workspaces": []}"#).unwrap();

        assert!(state.current_workspace.is_none());
    }
}
