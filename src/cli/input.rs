//! Keyboard input for an interactive rest countdown.
//!
//! Input is line based: a key followed by Enter.

use std::io::BufRead;

use tokio::sync::mpsc;

use crate::engine::{PromptChoice, TimerCommand};

// ============================================================================
// Key Commands
// ============================================================================

/// A key entered while the countdown is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Start the countdown again after a reset
    Go,
    Pause,
    Resume,
    Extend,
    Reset,
    Skip,
    Quit,
}

impl KeyCommand {
    /// Parses one input line. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "g" | "go" | "start" => Some(KeyCommand::Go),
            "p" | "pause" => Some(KeyCommand::Pause),
            "r" | "resume" => Some(KeyCommand::Resume),
            "+" | "extend" => Some(KeyCommand::Extend),
            "x" | "reset" => Some(KeyCommand::Reset),
            "s" | "skip" => Some(KeyCommand::Skip),
            "q" | "quit" => Some(KeyCommand::Quit),
            _ => None,
        }
    }

    /// Maps the key to an engine command. `Quit` has no engine counterpart.
    pub fn to_timer_command(self, extend_seconds: u64) -> Option<TimerCommand> {
        match self {
            KeyCommand::Go => Some(TimerCommand::Start),
            KeyCommand::Pause => Some(TimerCommand::Pause),
            KeyCommand::Resume => Some(TimerCommand::Resume),
            KeyCommand::Extend => Some(TimerCommand::AddTime(
                i64::try_from(extend_seconds).unwrap_or(i64::MAX),
            )),
            KeyCommand::Reset => Some(TimerCommand::Reset),
            KeyCommand::Skip => Some(TimerCommand::Skip),
            KeyCommand::Quit => None,
        }
    }
}

/// Parses the answer to the completion prompt.
///
/// Only an explicit extend answer extends; anything else proceeds.
pub fn parse_prompt_answer(line: &str) -> PromptChoice {
    match line.trim().to_ascii_lowercase().as_str() {
        "e" | "extend" | "+" => PromptChoice::Extend,
        _ => PromptChoice::Proceed,
    }
}

// ============================================================================
// Stdin Reader
// ============================================================================

/// Forwards stdin lines to the returned channel from a dedicated thread.
///
/// The channel closes on EOF or a read error. A plain thread is used so a
/// pending read never holds up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
        tracing::debug!("stdin closed");
    });
    rx
}

// ============================================================================
// Tests
// ============================================================================
