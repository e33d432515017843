//! Workspace CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::confirm::{AlwaysConfirm, ConfirmationPort, StdinConfirmation};
use super::output::Output;
use crate::domain::WorkspaceId;
use crate::storage::{AppState, BlobStore, Gateway};

#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Snapshot the current tasks under a name
    Save {
        /// Workspace name
        name: String,
    },

    /// Replace the current tasks with a saved workspace
    Load {
        /// Workspace id
        id: String,
    },

    /// Delete a saved workspace
    Delete {
        /// Workspace id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List saved workspaces
    List,
}

pub fn run(
    cmd: WorkspaceCommands,
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
) -> Result<()> {
    match cmd {
        WorkspaceCommands::Save { name } => save(state, gateway, output, &name),
        WorkspaceCommands::Load { id } => load(state, gateway, output, &id),
        WorkspaceCommands::Delete { id, yes } => delete(state, gateway, output, &id, yes),
        WorkspaceCommands::List => list(state, output),
    }
}

fn save(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    name: &str,
) -> Result<()> {
    let workspace = state.workspaces.save(name, state.board.tasks())?;
    let (id, name) = (workspace.id.clone(), workspace.name.clone());
    gateway.save_workspaces(&state.workspaces)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id.to_string(), "name": name }));
    } else {
        output.success(&format!("Saved workspace {}: {}", id, name));
    }
    Ok(())
}

fn load(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
) -> Result<()> {
    let id: WorkspaceId = id_str.parse()?;
    let workspace = state.workspaces.require(&id)?;
    let (name, todos) = (workspace.name.clone(), workspace.todos.clone());

    // Full replace, never a merge
    state.board.replace_tasks(todos);
    state.current_workspace = Some(id.clone());

    gateway.save_board(&state.board)?;
    gateway.save_current_workspace(state.current_workspace.as_ref())?;

    output.success(&format!("Loaded workspace: {}", name));
    Ok(())
}

fn delete(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
    yes: bool,
) -> Result<()> {
    let id: WorkspaceId = id_str.parse()?;
    let workspace = state.workspaces.require(&id)?;
    let prompt = format!("Delete workspace '{}'?", workspace.name);

    let mut port: Box<dyn ConfirmationPort> = if yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(StdinConfirmation)
    };
    if !port.confirm(&prompt) {
        output.success("Cancelled");
        return Ok(());
    }

    let removed = state.workspaces.remove(&id)?;
    gateway.save_workspaces(&state.workspaces)?;

    // The live tasks stay; only a pointer to the deleted snapshot is cleared
    if state.current_workspace.as_ref() == Some(&id) {
        state.current_workspace = None;
        gateway.save_current_workspace(None)?;
    }

    output.success(&format!("Deleted workspace: {}", removed.name));
    Ok(())
}

fn list(state: &AppState, output: &Output) -> Result<()> {
    let workspaces = state.workspaces.entries();

    if output.is_json() {
        let items: Vec<serde_json::Value> = workspaces
            .iter()
            .map(|w| {
                serde_json::json!({
                    "id": w.id.to_string(),
                    "name": w.name,
                    "tasks": w.todos.len(),
                    "createdAt": w.created_at,
                    "current": state.current_workspace.as_ref() == Some(&w.id),
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if workspaces.is_empty() {
        println!("No saved workspaces");
        return Ok(());
    }

    for workspace in workspaces {
        let marker = if state.current_workspace.as_ref() == Some(&workspace.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  {} ({} tasks)",
            marker,
            workspace.id,
            workspace.name,
            workspace.todos.len()
        );
    }
    Ok(())
}
