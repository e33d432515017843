//! Statistics, outline, settings and export/import CLI commands

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{format_outline, now_millis};
use crate::storage::{apply_import, export_json, AppState, BlobStore, Gateway};

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show the current settings
    Show,

    /// Change one setting
    Set {
        /// Setting name: prompt-mode, font-size, line-height, show-header, show-toolbar
        key: String,

        /// New value
        value: String,
    },
}

pub fn run_settings(
    cmd: SettingsCommands,
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            if output.is_json() {
                output.data(&state.settings);
            } else {
                let s = &state.settings;
                println!("prompt-mode:  {}", s.global_prompt_mode);
                println!("font-size:    {}", s.global_font_size);
                println!("line-height:  {}", s.global_line_height);
                println!("show-header:  {}", s.show_header);
                println!("show-toolbar: {}", s.show_toolbar);
            }
            Ok(())
        }
        SettingsCommands::Set { key, value } => {
            let s = &mut state.settings;
            match key.as_str() {
                "prompt-mode" => s.global_prompt_mode = value.parse()?,
                "font-size" => {
                    s.global_font_size = value
                        .parse()
                        .with_context(|| format!("invalid font size '{}'", value))?
                }
                "line-height" => {
                    s.global_line_height = value
                        .parse()
                        .with_context(|| format!("invalid line height '{}'", value))?
                }
                "show-header" => {
                    s.show_header = value
                        .parse()
                        .with_context(|| format!("invalid flag '{}'", value))?
                }
                "show-toolbar" => {
                    s.show_toolbar = value
                        .parse()
                        .with_context(|| format!("invalid flag '{}'", value))?
                }
                other => anyhow::bail!(
                    "unknown setting '{}' (expected prompt-mode, font-size, line-height, show-header or show-toolbar)",
                    other
                ),
            }
            gateway.save_settings(&state.settings)?;
            output.success(&format!("Set {} to {}", key, value));
            Ok(())
        }
    }
}

pub fn stats(state: &AppState, output: &Output) -> Result<()> {
    let stats = state.board.stats(now_millis());

    if output.is_json() {
        output.data(&stats);
        return Ok(());
    }

    println!("Total tasks:          {}", stats.total);
    println!("  main tasks:         {}", stats.main_tasks);
    println!("  sub-tasks:          {}", stats.sub_tasks);
    println!("Completed:            {}", stats.completed);
    println!("Pending:              {}", stats.pending);
    println!("Completion rate:      {}%", stats.completion_rate);
    println!("Created today:        {}", stats.created_today);
    println!("Completed this week:  {}", stats.completed_this_week);
    match stats.avg_completion_hours {
        Some(hours) => println!("Avg completion time:  {}h", hours),
        None => println!("Avg completion time:  n/a"),
    }
    Ok(())
}

pub fn outline(state: &AppState, output: &Output) -> Result<()> {
    let groups = state.board.incomplete_outline();
    if groups.is_empty() {
        anyhow::bail!("no incomplete tasks to outline");
    }

    let text = format_outline(&groups);
    if output.is_json() {
        output.data(&serde_json::json!({ "text": text }));
    } else {
        output.raw(&text);
    }
    Ok(())
}

pub fn export(state: &AppState, output: &Output, path: Option<&Path>) -> Result<()> {
    let json = export_json(state, chrono::Utc::now());

    match path {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            output.success(&format!("Exported database to {}", path.display()));
        }
        None => output.raw(&json),
    }
    Ok(())
}

pub fn import(
    state: &mut AppState,
    gateway: &Gateway<impl BlobStore>,
    output: &Output,
    path: &Path,
) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // apply_import is all-or-nothing: on malformed input nothing is mutated
    // and nothing gets persisted
    let summary = apply_import(state, &raw)?;

    if summary.todos.is_some() {
        gateway.save_tasks(state.board.tasks())?;
        gateway.save_selection(state.board.selection())?;
    }
    if summary.workspaces.is_some() {
        gateway.save_workspaces(&state.workspaces)?;
        gateway.save_current_workspace(state.current_workspace.as_ref())?;
    }
    if summary.saved_tasks.is_some() {
        gateway.save_templates(&state.templates)?;
    }
    if summary.settings {
        gateway.save_settings(&state.settings)?;
    }

    if output.is_json() {
        output.data(&summary);
        return Ok(());
    }

    let mut parts = Vec::new();
    if let Some(n) = summary.todos {
        parts.push(format!("{} tasks", n));
    }
    if let Some(n) = summary.workspaces {
        parts.push(format!("{} workspaces", n));
    }
    if let Some(n) = summary.saved_tasks {
        parts.push(format!("{} templates", n));
    }
    if summary.settings {
        parts.push("settings".to_string());
    }
    if parts.is_empty() {
        output.success("Nothing to import");
    } else {
        output.success(&format!("Imported {}", parts.join(", ")));
    }
    Ok(())
}
