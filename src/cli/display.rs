//! Display utilities for the rest timer CLI.
//!
//! This module provides formatted output for:
//! - The live countdown line
//! - Lifecycle messages (pause, resume, extend, ...)
//! - The completion prompt
//! - Status snapshots
//! - Error messages

use std::io::{self, Write};

use crate::engine::{CompletionEvent, CompletionPrompt};
use crate::types::TimerSnapshot;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the rest period about to start.
    pub fn show_rest_header(snapshot: &TimerSnapshot) {
        println!(
            "* Rest after {} (set {}/{})",
            snapshot.exercise, snapshot.set, snapshot.total_sets
        );
        println!("  Duration: {}", Self::format_clock(snapshot.initial_seconds));
        if let Some(next) = &snapshot.next_exercise {
            println!("  Up next: {}", next);
        }
        println!("  Keys: [p]ause [r]esume [+]extend [x] reset [g]o [s]kip [q]uit, then Enter");
    }

    /// Redraws the countdown line in place.
    pub fn show_tick(remaining_seconds: u64, initial_seconds: u64) {
        print!("\r{}", Self::tick_line(remaining_seconds, initial_seconds));
        let _ = io::stdout().flush();
    }

    pub fn show_started(remaining_seconds: u64) {
        println!("\r> Rest started: {} left", Self::format_clock(remaining_seconds));
    }

    pub fn show_paused(remaining_seconds: u64) {
        println!("\r|| Paused with {} left", Self::format_clock(remaining_seconds));
    }

    pub fn show_resumed(remaining_seconds: u64) {
        println!("\r> Resumed with {} left", Self::format_clock(remaining_seconds));
    }

    pub fn show_reset(remaining_seconds: u64) {
        println!(
            "\r[] Reset to {}, [g] to start again",
            Self::format_clock(remaining_seconds)
        );
    }

    pub fn show_skipped() {
        println!("\r>> Rest skipped");
    }

    pub fn show_extended(added_seconds: u64, remaining_seconds: u64) {
        println!(
            "\r+ Added {}s, {} left",
            added_seconds,
            Self::format_clock(remaining_seconds)
        );
    }

    /// Shows how much time passed while the process was stopped.
    pub fn show_drift(elapsed_seconds: u64, remaining_seconds: u64) {
        println!(
            "\r~ {}s passed while suspended, {} left",
            elapsed_seconds,
            Self::format_clock(remaining_seconds)
        );
    }

    /// Shows the completion summary.
    pub fn show_completion(event: &CompletionEvent) {
        println!(
            "\r* Rest complete: {} set {}/{} ({} total)",
            event.exercise,
            event.set,
            event.total_sets,
            Self::format_clock(event.elapsed_rest_seconds)
        );
    }

    /// Shows the post-completion follow-up question.
    pub fn show_completion_prompt(prompt: &CompletionPrompt) {
        if let Some(next) = &prompt.next_exercise {
            println!("  Next up: {}", next);
        }
        if prompt.offer_extend {
            println!(
                "  [e] rest {}s more, Enter to continue",
                prompt.extend_seconds
            );
        } else {
            println!("  Enter to continue");
        }
    }

    /// Rings the terminal bell.
    pub fn ring_bell() {
        print!("\x07");
        let _ = io::stdout().flush();
    }

    /// Shows a snapshot as human-readable status.
    pub fn show_status(snapshot: &TimerSnapshot) {
        println!("Rest timer status");
        println!("─────────────────────────────");
        println!("State: {}", snapshot.state.as_str());
        println!("Exercise: {}", snapshot.exercise);
        println!("Set: {}/{}", snapshot.set, snapshot.total_sets);
        if let Some(next) = &snapshot.next_exercise {
            println!("Next: {}", next);
        }
        println!(
            "Remaining: {} of {}",
            Self::format_clock(snapshot.remaining_seconds),
            Self::format_clock(snapshot.initial_seconds)
        );
        println!("Progress: {:.0}%", snapshot.percent_complete);
    }

    /// Shows a snapshot as pretty-printed JSON.
    pub fn show_status_json(snapshot: &TimerSnapshot) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        Ok(())
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Builds the countdown line, e.g. `  1:05 [#######.............]`.
    pub fn tick_line(remaining_seconds: u64, initial_seconds: u64) -> String {
        let elapsed = initial_seconds.saturating_sub(remaining_seconds);
        format!(
            "  {} [{}]",
            Self::format_clock(remaining_seconds),
            Self::progress_bar(elapsed, initial_seconds, BAR_WIDTH)
        )
    }

    /// Renders `done` out of `total` as a fixed-width bar.
    fn progress_bar(done: u64, total: u64, width: usize) -> String {
        let filled = if total == 0 {
            width
        } else {
            ((done.min(total) as u128 * width as u128) / total as u128) as usize
        };
        format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
    }

    /// Formats seconds as `M:SS`.
    pub fn format_clock(total_seconds: u64) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{}:{:02}", minutes, seconds)
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u64) -> (u64, u64) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

// ============================================================================
// Tests
// ============================================================================
