//! CLI module for the rest timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `runner`: Interactive countdown wiring the engine to the terminal
//! - `input`: Keyboard input parsing
//! - `signals`: Job-control signal forwarding (Unix only)
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod display;
pub mod input;
pub mod runner;
#[cfg(unix)]
pub mod signals;

pub use commands::{Cli, Commands, RestArgs, StatusArgs};
pub use display::Display;
pub use runner::{preview, run_rest, RunOutcome};
