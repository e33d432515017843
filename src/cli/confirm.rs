//! Confirmation port for destructive commands
//!
//! Delete flows ask through this seam instead of embedding prompts in the
//! store, so cascade deletion stays deterministic and testable without a
//! terminal attached.

use std::io::{self, BufRead, Write};

/// Answers yes/no questions before destructive operations
pub trait ConfirmationPort {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Asks on stderr and reads the answer from stdin
pub struct StdinConfirmation;

impl ConfirmationPort for StdinConfirmation {
    fn confirm(&mut self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Confirms everything; used for `--yes`
pub struct AlwaysConfirm;

impl ConfirmationPort for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}
