//! Taskpad - Local-first personal task manager

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskpad_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
