//! Saved-task template CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{SaveOutcome, TemplateId};
use crate::storage::{AppState, BlobStore, Gateway};

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Save a text as a reusable template
    Save {
        /// Template text
        text: String,
    },

    /// List templates, most used first
    List,

    /// Delete a template
    Delete {
        /// Template id
        id: String,
    },

    /// Create a task from a template, bumping its usage count
    Use {
        /// Template text
        text: String,
    },

    /// Suggest templates matching a query
    Suggest {
        /// Substring to match
        query: String,
    },
}

pub fn run(
    cmd: TemplateCommands,
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
) -> Result<()> {
    match cmd {
        TemplateCommands::Save { text } => save(state, gateway, output, &text),
        TemplateCommands::List => list(state, output),
        TemplateCommands::Delete { id } => delete(state, gateway, output, &id),
        TemplateCommands::Use { text } => use_template(state, gateway, output, &text),
        TemplateCommands::Suggest { query } => suggest(state, output, &query),
    }
}

fn save(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    text: &str,
) -> Result<()> {
    match state.templates.save(text)? {
        SaveOutcome::Saved(id) => {
            gateway.save_templates(&state.templates)?;
            output.success(&format!("Saved template {}", id));
        }
        SaveOutcome::AlreadyExists => {
            output.success("Template already exists");
        }
    }
    Ok(())
}

fn list(state: &AppState, output: &Output) -> Result<()> {
    let mut templates: Vec<_> = state.templates.entries().iter().collect();
    templates.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));

    if output.is_json() {
        output.data(&templates);
        return Ok(());
    }

    if templates.is_empty() {
        println!("No templates");
        return Ok(());
    }

    for template in templates {
        println!(
            "{}  {} (used {}x)",
            template.id, template.text, template.usage_count
        );
    }
    Ok(())
}

fn delete(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    id_str: &str,
) -> Result<()> {
    let id: TemplateId = id_str.parse()?;
    let removed = state.templates.remove(&id)?;
    gateway.save_templates(&state.templates)?;

    output.success(&format!("Deleted template: {}", removed.text));
    Ok(())
}

/// Creates a main task from the template text and records the use
fn use_template(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    text: &str,
) -> Result<()> {
    let task = state.board.add_task(text, None)?;
    if state.templates.record_use(&task.text) {
        gateway.save_templates(&state.templates)?;
    }
    gateway.save_tasks(state.board.tasks())?;

    if output.is_json() {
        output.data(&serde_json::json!({ "id": task.id.to_string(), "text": task.text }));
    } else {
        output.success(&format!("Created task {} from template", task.id));
    }
    Ok(())
}

fn suggest(state: &AppState, output: &Output, query: &str) -> Result<()> {
    let hits = state.templates.suggestions(query, 5);

    if output.is_json() {
        output.data(&hits);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matching templates");
        return Ok(());
    }

    for template in hits {
        println!("{} (used {}x)", template.text, template.usage_count);
    }
    Ok(())
}
