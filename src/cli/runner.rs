//! Interactive rest countdown.
//!
//! This module wires the engine to the terminal:
//! - Tick source and wall clock for a live [`RestTimer`]
//! - Stdin keys translated to timer commands
//! - Job-control signals forwarded as lifecycle notices (Unix only)
//! - Timer events rendered through [`Display`]

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::cli::commands::RestArgs;
use crate::cli::display::Display;
use crate::cli::input::{parse_prompt_answer, spawn_stdin_reader, KeyCommand};
use crate::engine::{
    PromptChoice, RestTimer, SystemClock, TimerCommand, TimerEvent, TokioTickSource,
};
use crate::types::{TimerSession, TimerSnapshot};

// ============================================================================
// Outcome
// ============================================================================

/// How an interactive rest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The countdown reached zero and the prompt was answered
    Completed,
    /// The rest was skipped before reaching zero
    Skipped,
    /// The user quit
    Quit,
}

/// What the runner does next after an event or an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Continue,
    Send(TimerCommand),
    Finish(RunOutcome),
}

// ============================================================================
// RunState
// ============================================================================

/// Terminal-side state of one interactive rest.
#[derive(Debug)]
struct RunState {
    initial_seconds: u64,
    extend_seconds: u64,
    bell: bool,
    awaiting_prompt: bool,
    stdin_closed: bool,
    completed: bool,
}

impl RunState {
    fn new(args: &RestArgs) -> Self {
        Self {
            initial_seconds: args.seconds,
            extend_seconds: args.extend,
            bell: !args.no_bell,
            awaiting_prompt: false,
            stdin_closed: false,
            completed: false,
        }
    }

    fn on_event(&mut self, event: &TimerEvent) -> Step {
        match event {
            TimerEvent::Configured {
                initial_seconds, ..
            } => self.initial_seconds = *initial_seconds,
            TimerEvent::DurationChanged { seconds } => self.initial_seconds = *seconds,
            TimerEvent::Started { remaining_seconds } => Display::show_started(*remaining_seconds),
            TimerEvent::Tick { remaining_seconds } => {
                Display::show_tick(*remaining_seconds, self.initial_seconds)
            }
            TimerEvent::Paused { remaining_seconds } => Display::show_paused(*remaining_seconds),
            TimerEvent::Resumed { remaining_seconds } => Display::show_resumed(*remaining_seconds),
            TimerEvent::Reset { remaining_seconds } => Display::show_reset(*remaining_seconds),
            TimerEvent::Extended {
                added_seconds,
                remaining_seconds,
                initial_seconds,
            } => {
                self.initial_seconds = *initial_seconds;
                self.awaiting_prompt = false;
                self.completed = false;
                Display::show_extended(*added_seconds, *remaining_seconds);
            }
            TimerEvent::DriftApplied {
                elapsed_seconds,
                remaining_seconds,
            } => Display::show_drift(*elapsed_seconds, *remaining_seconds),
            TimerEvent::RestCompleted(completion) => {
                self.completed = true;
                Display::show_completion(completion);
            }
            TimerEvent::HapticRequested(_) => {
                if self.bell {
                    Display::ring_bell();
                }
            }
            TimerEvent::CompletionPromptRequested(prompt) => {
                Display::show_completion_prompt(prompt);
                self.awaiting_prompt = true;
                if self.stdin_closed {
                    return self.answer_prompt(PromptChoice::Proceed);
                }
            }
            TimerEvent::Skipped => {
                if self.completed {
                    return Step::Finish(RunOutcome::Completed);
                }
                Display::show_skipped();
                return Step::Finish(RunOutcome::Skipped);
            }
            TimerEvent::CommandRejected(e) => Display::show_error(&e.to_string()),
        }
        Step::Continue
    }

    /// Handles one stdin line, or EOF when `line` is `None`.
    fn on_line(&mut self, line: Option<&str>) -> Step {
        let Some(line) = line else {
            self.stdin_closed = true;
            if self.awaiting_prompt {
                return self.answer_prompt(PromptChoice::Proceed);
            }
            return Step::Continue;
        };

        if self.awaiting_prompt {
            return self.answer_prompt(parse_prompt_answer(line));
        }

        match KeyCommand::parse(line) {
            Some(KeyCommand::Quit) => Step::Finish(RunOutcome::Quit),
            Some(key) => key
                .to_timer_command(self.extend_seconds)
                .map_or(Step::Continue, Step::Send),
            None => {
                tracing::debug!(input = line.trim(), "ignoring unknown key");
                Step::Continue
            }
        }
    }

    fn answer_prompt(&mut self, choice: PromptChoice) -> Step {
        self.awaiting_prompt = false;
        Step::Send(TimerCommand::RespondToPrompt(choice))
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Validates the arguments and returns the snapshot of the rest they describe.
///
/// No session exists yet, so the snapshot carries no session id.
pub fn preview(args: &RestArgs) -> Result<TimerSnapshot> {
    let config = args.to_config();
    config.validate()?;
    let mut snapshot = TimerSession::new(config).snapshot();
    snapshot.session_id = None;
    Ok(snapshot)
}

/// Runs one rest countdown interactively until it is finished or abandoned.
pub async fn run_rest(args: &RestArgs) -> Result<RunOutcome> {
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let (source, ticks) = TokioTickSource::channel();
    let (life_tx, life_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let mut timer = RestTimer::new(
        args.to_config(),
        args.to_settings(),
        Box::new(source),
        Box::new(SystemClock),
        event_tx,
    )?;

    Display::show_rest_header(&timer.snapshot());

    #[cfg(unix)]
    let _signals = match crate::cli::signals::SignalForwarder::spawn(life_tx) {
        Ok(forwarder) => Some(forwarder),
        Err(e) => {
            tracing::warn!(error = %e, "job-control signals unavailable");
            None
        }
    };
    #[cfg(not(unix))]
    let _life_tx = life_tx;

    timer.start();
    let engine = tokio::spawn(async move {
        timer.run(ticks, life_rx, cmd_rx).await;
        timer
    });

    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut state = RunState::new(args);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        let step = tokio::select! {
            event = events.recv() => match event {
                Some(event) => state.on_event(&event),
                None => Step::Finish(RunOutcome::Quit),
            },
            line = lines.recv(), if stdin_open => {
                if line.is_none() {
                    stdin_open = false;
                }
                state.on_line(line.as_deref())
            }
            _ = &mut ctrl_c => Step::Finish(RunOutcome::Quit),
        };

        match step {
            Step::Continue => {}
            Step::Send(command) => {
                if cmd_tx.send(command).is_err() {
                    break RunOutcome::Quit;
                }
            }
            Step::Finish(outcome) => break outcome,
        }
    };

    let _ = cmd_tx.send(TimerCommand::Shutdown);
    let timer = engine.await.context("timer task failed")?;
    println!();
    tracing::info!(
        outcome = ?outcome,
        status = timer.status().as_str(),
        remaining_seconds = timer.remaining_seconds(),
        "rest finished"
    );

    Ok(outcome)
}

// ============================================================================
// Tests
// ============================================================================
