//! Command definitions for the rest timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::types::{ExerciseInfo, RestConfig, TimerSettings};

// ============================================================================
// CLI Structure
// ============================================================================

/// Rest timer CLI - countdown between training sets
#[derive(Parser, Debug)]
#[command(
    name = "rest-timer",
    version,
    about = "Rest interval countdown between training sets",
    long_about = "Counts down the rest between two sets in the terminal.\n\
                  Suspending the process (Ctrl-Z) does not freeze the countdown: \
                  the time spent stopped is subtracted when it continues.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a rest countdown in the terminal
    Run(RestArgs),

    /// Show the rest period that would be started, without running it (no session id)
    Status(StatusArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Rest Arguments
// ============================================================================

/// Arguments describing one rest period
#[derive(Args, Debug, Clone)]
pub struct RestArgs {
    /// Rest duration in seconds (1-3600)
    #[arg(
        short,
        long,
        default_value = "90",
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub seconds: u64,

    /// Exercise the rest follows
    #[arg(short, long, default_value = "Exercise", value_parser = validate_exercise_name)]
    pub exercise: String,

    /// Exercise coming up after the rest
    #[arg(short, long, value_parser = validate_exercise_name)]
    pub next: Option<String>,

    /// Set that was just finished (1-100)
    #[arg(
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub set: u32,

    /// Total number of sets (1-100)
    #[arg(
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub total_sets: u32,

    /// Seconds added by the extend key and completion prompt (1-600)
    #[arg(
        long,
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..=600)
    )]
    pub extend: u64,

    /// Do not ring the terminal bell on completion
    #[arg(long)]
    pub no_bell: bool,
}

impl Default for RestArgs {
    fn default() -> Self {
        Self {
            seconds: 90,
            exercise: "Exercise".to_string(),
            next: None,
            set: 1,
            total_sets: 1,
            extend: 30,
            no_bell: false,
        }
    }
}

impl RestArgs {
    /// Builds the rest configuration for these arguments.
    pub fn to_config(&self) -> RestConfig {
        RestConfig {
            initial_seconds: self.seconds,
            info: ExerciseInfo {
                exercise: self.exercise.clone(),
                next_exercise: self.next.clone(),
                set: self.set,
                total_sets: self.total_sets,
            },
        }
    }

    /// Builds the engine settings for these arguments.
    pub fn to_settings(&self) -> TimerSettings {
        TimerSettings {
            extend_increment_seconds: self.extend,
            ..TimerSettings::default()
        }
    }
}

/// Arguments for the status command
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    #[command(flatten)]
    pub rest: RestArgs,

    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates an exercise name.
///
/// - Must not be blank
/// - Must not exceed 100 characters
fn validate_exercise_name(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("exercise name must not be empty".to_string());
    }
    if s.chars().count() > 100 {
        return Err("exercise name must be at most 100 characters".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
