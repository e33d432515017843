//! Task CLI commands

use anyhow::Result;

use super::app::SelectCommands;
use super::confirm::{AlwaysConfirm, ConfirmationPort, StdinConfirmation};
use super::output::Output;
use crate::domain::{PromptMode, Scope, Task, TaskId, TaskPatch};
use crate::storage::{AppState, BlobStore, Gateway};

/// Optional fields of the `edit` command
pub struct EditFlags {
    pub notes: Option<String>,
    pub prompt_mode: Option<String>,
    pub font_size: Option<u32>,
    pub technologies: Option<Vec<String>>,
    pub completed: Option<bool>,
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id.to_string(),
        "text": task.text,
        "completed": task.completed,
        "parentId": task.parent_id.as_ref().map(|p| p.to_string()),
        "order": task.order,
    })
}

fn checkbox(task: &Task) -> &'static str {
    if task.completed {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn add(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    text: &str,
    parent: Option<&str>,
) -> Result<()> {
    let parent_id = parent.map(|p| p.parse::<TaskId>()).transpose()?;
    let task = state.board.add_task(text, parent_id.as_ref())?;
    gateway.save_tasks(state.board.tasks())?;

    if output.is_json() {
        output.data(&task_json(&task));
    } else if task.is_main() {
        output.success(&format!("Created task {}: {}", task.id, task.text));
    } else {
        output.success(&format!("Created sub-task {}: {}", task.id, task.text));
    }
    Ok(())
}

pub fn list(state: &AppState, output: &Output, hide_completed: bool) -> Result<()> {
    let board = &state.board;
    let mains = board.visible_main_tasks(hide_completed);

    if output.is_json() {
        let items: Vec<serde_json::Value> = mains
            .iter()
            .map(|main| {
                let subs: Vec<serde_json::Value> = board
                    .visible_subtasks_of(&main.id, hide_completed)
                    .iter()
                    .map(|s| task_json(s))
                    .collect();
                let mut value = task_json(main);
                value["subtasks"] = serde_json::Value::Array(subs);
                value
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if mains.is_empty() {
        println!("No tasks");
        return Ok(());
    }

    for main in mains {
        println!("{} {}  {}", checkbox(main), main.id, main.text);
        for sub in board.visible_subtasks_of(&main.id, hide_completed) {
            println!("    {} {}  {}", checkbox(sub), sub.id, sub.text);
        }
    }
    Ok(())
}

pub fn show(state: &AppState, output: &Output, id_str: &str) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let task = state
        .board
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

    if output.is_json() {
        output.data(task);
        return Ok(());
    }

    println!("{} {}  {}", checkbox(task), task.id, task.text);
    if let Some(parent) = &task.parent_id {
        println!("  parent: {}", parent);
    }
    println!("  order: {}", task.order);
    println!("  created: {}", task.created_at);
    println!("  updated: {}", task.updated_at);
    if let Some(mode) = task.prompt_mode {
        println!("  prompt mode: {}", mode);
    }
    if let Some(technologies) = &task.technologies {
        println!("  technologies: {}", technologies.join(", "));
    }
    if let Some(notes) = &task.notes {
        println!("  notes: {}", notes);
    }
    for sub in state.board.subtasks_of(&task.id) {
        println!("    {} {}  {}", checkbox(sub), sub.id, sub.text);
    }
    Ok(())
}

pub fn edit(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
    text: &str,
    flags: EditFlags,
) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let prompt_mode = flags
        .prompt_mode
        .as_deref()
        .map(|m| m.parse::<PromptMode>())
        .transpose()?;

    let patch = TaskPatch {
        completed: flags.completed,
        prompt_mode,
        technologies: flags.technologies,
        notes: flags.notes,
        font_size: flags.font_size,
    };

    let task = state.board.update_task(&id, text, &patch)?;
    gateway.save_tasks(state.board.tasks())?;

    if output.is_json() {
        output.data(&task_json(&task));
    } else {
        output.success(&format!("Updated task {}", task.id));
    }
    Ok(())
}

pub fn toggle(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let completed = state.board.toggle_completion(&id)?;
    gateway.save_tasks(state.board.tasks())?;

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id.to_string(), "completed": completed }));
    } else if completed {
        output.success(&format!("Completed task {}", id));
    } else {
        output.success(&format!("Reopened task {}", id));
    }
    Ok(())
}

pub fn delete(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
    yes: bool,
) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let task = state
        .board
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

    let sub_count = if task.is_main() {
        state.board.subtasks_of(&id).len()
    } else {
        0
    };
    let prompt = if sub_count > 0 {
        format!(
            "Delete task '{}' and its {} sub-task(s)?",
            task.text, sub_count
        )
    } else {
        format!("Delete task '{}'?", task.text)
    };

    let mut port: Box<dyn ConfirmationPort> = if yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(StdinConfirmation)
    };
    if !port.confirm(&prompt) {
        output.success("Cancelled");
        return Ok(());
    }

    let removed = state.board.delete_task(&id)?;
    gateway.save_tasks(state.board.tasks())?;
    gateway.save_selection(state.board.selection())?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "deleted": removed.iter().map(|t| t.id.to_string()).collect::<Vec<_>>(),
        }));
    } else {
        output.success(&format!("Deleted {} task(s)", removed.len()));
    }
    Ok(())
}

pub fn move_task(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    from: usize,
    to: usize,
    parent: Option<&str>,
    dest_parent: Option<&str>,
) -> Result<()> {
    let source = match parent {
        None => Scope::Root,
        Some(p) => Scope::Children(p.parse()?),
    };
    let dest = match dest_parent {
        None => source.clone(),
        Some(p) => Scope::Children(p.parse()?),
    };

    let changed = state.board.move_task(&source, from, &dest, to)?;
    if !changed {
        // The no-op move must not trigger a persistence write
        output.success("No change");
        return Ok(());
    }

    gateway.save_tasks(state.board.tasks())?;
    output.success(&format!("Moved position {} to {}", from, to));
    Ok(())
}

pub fn copy(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let clip = state.board.copy_task(&id)?;
    gateway.save_clipboard(state.board.clipboard())?;

    output.success(&format!("Copied task: {}", clip.text));
    Ok(())
}

pub fn paste(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    parent: Option<&str>,
) -> Result<()> {
    let parent_id = parent.map(|p| p.parse::<TaskId>()).transpose()?;
    let task = state.board.paste_task(parent_id.as_ref())?;
    gateway.save_tasks(state.board.tasks())?;

    if output.is_json() {
        output.data(&task_json(&task));
    } else {
        output.success(&format!("Pasted as task {}", task.id));
    }
    Ok(())
}

pub fn copy_incomplete(state: &AppState, output: &Output) -> Result<()> {
    let text = state.board.copy_all_incomplete();
    if output.is_json() {
        output.data(&serde_json::json!({ "text": text }));
    } else {
        output.raw(&text);
    }
    Ok(())
}

pub fn copy_selected(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
) -> Result<()> {
    let text = state.board.copy_selected()?;
    // A successful bulk copy clears the selection
    gateway.save_selection(state.board.selection())?;

    if output.is_json() {
        output.data(&serde_json::json!({ "text": text }));
    } else {
        output.raw(&text);
    }
    Ok(())
}

pub fn run_select(
    cmd: SelectCommands,
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
) -> Result<()> {
    match cmd {
        SelectCommands::All => {
            state.board.select_all();
            gateway.save_selection(state.board.selection())?;
            output.success(&format!("Selected {} task(s)", state.board.selection().len()));
        }
        SelectCommands::Clear => {
            state.board.clear_selection();
            gateway.save_selection(state.board.selection())?;
            output.success("Selection cleared");
        }
        SelectCommands::Toggle { id } => {
            let id: TaskId = id.parse()?;
            let selected = state.board.toggle_selected(&id)?;
            gateway.save_selection(state.board.selection())?;
            if selected {
                output.success(&format!("Selected task {}", id));
            } else {
                output.success(&format!("Deselected task {}", id));
            }
        }
        SelectCommands::Show => {
            let mut ids: Vec<String> = state
                .board
                .selection()
                .iter()
                .map(|id| id.to_string())
                .collect();
            ids.sort();
            if output.is_json() {
                output.data(&ids);
            } else if ids.is_empty() {
                println!("Nothing selected");
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
        }
    }
    Ok(())
}
