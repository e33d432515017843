//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{data, task, template, workspace};
use crate::storage::{Config, ConfigFormat, FileBlobStore, Gateway};

#[derive(Parser)]
#[command(name = "taskpad")]
#[command(author, version, about = "Local-first personal task manager")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Where the task data lives (defaults to the platform data directory)
    #[arg(long, global = true, env = "TASKPAD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task, or a sub-task when --parent is given
    Add {
        /// Task text
        text: String,

        /// Id of the main task to add under
        #[arg(long)]
        parent: Option<String>,
    },

    /// List all tasks
    List {
        /// Hide completed tasks
        #[arg(long)]
        hide_completed: bool,
    },

    /// Show task details
    Show {
        /// Task id
        id: String,
    },

    /// Rewrite a task's text and optionally its preferences
    Edit {
        /// Task id
        id: String,

        /// New task text
        text: String,

        /// Attach notes
        #[arg(long)]
        notes: Option<String>,

        /// Per-task prompt mode (full-code, code-changes, notes)
        #[arg(long)]
        prompt_mode: Option<String>,

        /// Per-task font size
        #[arg(long)]
        font_size: Option<u32>,

        /// Technologies, comma separated
        #[arg(long = "tech", value_delimiter = ',')]
        technologies: Option<Vec<String>>,

        /// Set the completion flag directly
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Toggle a task's completion
    Toggle {
        /// Task id
        id: String,
    },

    /// Delete a task; deleting a main task deletes its sub-tasks too
    Delete {
        /// Task id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Reorder tasks within one scope
    Move {
        /// Current position within the scope
        from: usize,

        /// Target position within the scope
        to: usize,

        /// Scope: sub-tasks of this main task (omit for main tasks)
        #[arg(long)]
        parent: Option<String>,

        /// Destination scope; must match the source scope
        #[arg(long)]
        dest_parent: Option<String>,
    },

    /// Copy a task into the clipboard slot
    Copy {
        /// Task id
        id: String,
    },

    /// Paste the clipboard as a new task
    Paste {
        /// Id of the main task to paste under
        #[arg(long)]
        parent: Option<String>,
    },

    /// Render all incomplete tasks as copyable text
    CopyIncomplete,

    /// Render the selected tasks as copyable text and clear the selection
    CopySelected,

    /// Manage the selection set
    #[command(subcommand)]
    Select(SelectCommands),

    /// Manage workspace snapshots
    #[command(subcommand)]
    Workspace(workspace::WorkspaceCommands),

    /// Manage saved-task templates
    #[command(subcommand)]
    Template(template::TemplateCommands),

    /// Manage global settings
    #[command(subcommand)]
    Settings(data::SettingsCommands),

    /// Show task statistics
    Stats,

    /// Print a numbered outline of all incomplete tasks
    Outline,

    /// Export the full database as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Import a previously exported database
    Import {
        /// Path to the export document
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum SelectCommands {
    /// Select every task
    All,

    /// Clear the selection
    Clear,

    /// Toggle one task in or out of the selection
    Toggle {
        /// Task id
        id: String,
    },

    /// Show the current selection
    Show,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let format = cli.format.unwrap_or(match config.default_format {
        ConfigFormat::Text => OutputFormat::Text,
        ConfigFormat::Json => OutputFormat::Json,
    });
    let output = Output::new(format, cli.verbose);

    let data_dir = config.resolve_data_dir(cli.data_dir.as_deref())?;
    output.verbose_ctx("startup", &format!("data dir: {}", data_dir.display()));

    let gateway = Gateway::new(FileBlobStore::new(data_dir));
    let mut state = gateway.load()?;
    output.verbose_ctx(
        "startup",
        &format!(
            "loaded {} tasks, {} workspaces, {} templates",
            state.board.len(),
            state.workspaces.len(),
            state.templates.len()
        ),
    );

    match cli.command {
        Commands::Add { text, parent } => {
            task::add(&mut state, &gateway, &output, &text, parent.as_deref())
        }
        Commands::List { hide_completed } => task::list(&state, &output, hide_completed),
        Commands::Show { id } => task::show(&state, &output, &id),
        Commands::Edit {
            id,
            text,
            notes,
            prompt_mode,
            font_size,
            technologies,
            completed,
        } => task::edit(
            &mut state,
            &gateway,
            &output,
            &id,
            &text,
            task::EditFlags {
                notes,
                prompt_mode,
                font_size,
                technologies,
                completed,
            },
        ),
        Commands::Toggle { id } => task::toggle(&mut state, &gateway, &output, &id),
        Commands::Delete { id, yes } => task::delete(&mut state, &gateway, &output, &id, yes),
        Commands::Move {
            from,
            to,
            parent,
            dest_parent,
        } => task::move_task(
            &mut state,
            &gateway,
            &output,
            from,
            to,
            parent.as_deref(),
            dest_parent.as_deref(),
        ),
        Commands::Copy { id } => task::copy(&mut state, &gateway, &output, &id),
        Commands::Paste { parent } => {
            task::paste(&mut state, &gateway, &output, parent.as_deref())
        }
        Commands::CopyIncomplete => task::copy_incomplete(&state, &output),
        Commands::CopySelected => task::copy_selected(&mut state, &gateway, &output),
        Commands::Select(cmd) => task::run_select(cmd, &mut state, &gateway, &output),
        Commands::Workspace(cmd) => workspace::run(cmd, &mut state, &gateway, &output),
        Commands::Template(cmd) => template::run(cmd, &mut state, &gateway, &output),
        Commands::Settings(cmd) => data::run_settings(cmd, &mut state, &gateway, &output),
        Commands::Stats => data::stats(&state, &output),
        Commands::Outline => data::outline(&state, &output),
        Commands::Export { output: path } => data::export(&state, &output, path.as_deref()),
        Commands::Import { path } => data::import(&mut state, &gateway, &output, &path),
    }
}
