//! Rest timer engine.
//!
//! This module provides the countdown state machine and its wiring:
//! - State transitions (Idle → Running ⇄ Paused → Completed)
//! - Tick handling through the single-registration [`TickScheduler`]
//! - Suspend/resume reconciliation through [`BackgroundDriftCompensator`]
//! - Exactly-once completion through [`CompletionDispatcher`]
//! - An async loop that multiplexes ticks, lifecycle signals and commands

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::types::{RestConfig, TimerSession, TimerSettings, TimerSnapshot, TimerStatus};

use super::clock::Clock;
use super::completion::{
    CompletionDispatcher, CompletionEvent, CompletionPrompt, HapticPattern, PromptChoice,
};
use super::drift::{elapsed_millis, BackgroundDriftCompensator};
use super::error::TimerError;
use super::scheduler::{RegistrationId, TickScheduler, TickSource};

// ============================================================================
// TimerEvent
// ============================================================================

/// Outbound events for the presentation and logging layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A new rest period was configured
    Configured {
        session_id: Uuid,
        initial_seconds: u64,
    },
    /// Countdown started
    Started { remaining_seconds: u64 },
    /// Countdown paused
    Paused { remaining_seconds: u64 },
    /// Countdown resumed after a pause
    Resumed { remaining_seconds: u64 },
    /// Countdown reset to its full duration
    Reset { remaining_seconds: u64 },
    /// Countdown abandoned without completion
    Skipped,
    /// Time was added
    Extended {
        added_seconds: u64,
        remaining_seconds: u64,
        initial_seconds: u64,
    },
    /// Duration replaced by a custom value
    DurationChanged { seconds: u64 },
    /// One second elapsed
    Tick { remaining_seconds: u64 },
    /// Suspended wall-clock time was subtracted on resume
    DriftApplied {
        elapsed_seconds: u64,
        remaining_seconds: u64,
    },
    /// Rest period finished (at most once per countdown)
    RestCompleted(CompletionEvent),
    /// Presentation layer should play haptic feedback
    HapticRequested(HapticPattern),
    /// Presentation layer should show the "rest complete" prompt
    CompletionPromptRequested(CompletionPrompt),
    /// A command sent over the channel was rejected
    CommandRejected(TimerError),
}

/// Sends an event, ignoring a receiver that has gone away.
pub(crate) fn emit(tx: &mpsc::UnboundedSender<TimerEvent>, event: TimerEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("event receiver dropped; event discarded");
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Host lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Host is about to stop delivering ticks
    Suspend,
    /// Host is delivering ticks again
    Resume,
}

/// A lifecycle signal as delivered to [`RestTimer::run`].
///
/// A notice created with [`LifecycleNotice::with_ack`] is acknowledged once
/// the engine has handled it, so a host can hold off actually suspending
/// until the suspend marker is recorded.
#[derive(Debug)]
pub struct LifecycleNotice {
    pub signal: LifecycleSignal,
    ack: Option<oneshot::Sender<()>>,
}

impl LifecycleNotice {
    pub fn new(signal: LifecycleSignal) -> Self {
        Self { signal, ack: None }
    }

    /// Creates a notice plus the receiver that resolves once it is handled.
    pub fn with_ack(signal: LifecycleSignal) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                signal,
                ack: Some(tx),
            },
            rx,
        )
    }

    fn acknowledge(self) {
        if let Some(ack) = self.ack {
            let _ = ack.send(());
        }
    }
}

impl From<LifecycleSignal> for LifecycleNotice {
    fn from(signal: LifecycleSignal) -> Self {
        Self::new(signal)
    }
}

/// Operations a caller can send to a running [`RestTimer::run`] loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Reset,
    Skip,
    AddTime(i64),
    SetCustomDuration(i64),
    Configure(RestConfig),
    RespondToPrompt(PromptChoice),
    /// Stops the run loop
    Shutdown,
}

// ============================================================================
// RestTimer
// ============================================================================

/// Countdown state machine for one rest period at a time.
///
/// All operations are synchronous and expected to run on a single execution
/// context. Operations that do not apply in the current state are no-ops
/// and return `false`.
pub struct RestTimer {
    session: TimerSession,
    scheduler: TickScheduler,
    drift: BackgroundDriftCompensator,
    dispatcher: CompletionDispatcher,
    clock: Box<dyn Clock>,
    settings: TimerSettings,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    /// Epoch millis at which the current tick period began
    tick_anchor_millis: i64,
    /// Progress into the tick period when the host suspended
    phase_at_suspend: Duration,
}

impl RestTimer {
    /// Creates an idle timer for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(
        config: RestConfig,
        settings: TimerSettings,
        tick_source: Box<dyn TickSource>,
        clock: Box<dyn Clock>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Result<Self, TimerError> {
        config.validate()?;

        let session = TimerSession::new(config);
        tracing::debug!(
            session_id = %session.id,
            initial_seconds = session.initial_seconds,
            "rest session created"
        );

        Ok(Self {
            session,
            scheduler: TickScheduler::new(tick_source, settings.tick_period),
            drift: BackgroundDriftCompensator::new(),
            dispatcher: CompletionDispatcher::new(
                event_tx.clone(),
                settings.extend_increment_seconds,
            ),
            clock,
            settings,
            event_tx,
            tick_anchor_millis: 0,
            phase_at_suspend: Duration::ZERO,
        })
    }

    /// Replaces the current session with a fresh one.
    ///
    /// The previous session's tick registration and suspend marker are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate; the current
    /// session is kept in that case.
    pub fn configure(&mut self, config: RestConfig) -> Result<(), TimerError> {
        config.validate()?;

        self.scheduler.cancel();
        self.drift.clear();
        self.session = TimerSession::new(config);

        tracing::debug!(session_id = %self.session.id, "rest session replaced");
        self.emit(TimerEvent::Configured {
            session_id: self.session.id,
            initial_seconds: self.session.initial_seconds,
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // State machine operations
    // ------------------------------------------------------------------------

    /// Starts (or restarts) the countdown.
    pub fn start(&mut self) -> bool {
        if !self.session.start() {
            return false;
        }

        self.drift.clear();
        self.begin_ticking(self.settings.tick_period);

        tracing::debug!(remaining_seconds = self.session.remaining_seconds, "rest started");
        self.emit(TimerEvent::Started {
            remaining_seconds: self.session.remaining_seconds,
        });
        true
    }

    /// Pauses a running countdown.
    pub fn pause(&mut self) -> bool {
        if !self.session.pause() {
            return false;
        }

        self.scheduler.cancel();
        self.drift.clear();

        tracing::debug!(remaining_seconds = self.session.remaining_seconds, "rest paused");
        self.emit(TimerEvent::Paused {
            remaining_seconds: self.session.remaining_seconds,
        });
        true
    }

    /// Resumes a paused countdown.
    pub fn resume(&mut self) -> bool {
        if !self.session.resume() {
            return false;
        }

        self.begin_ticking(self.settings.tick_period);

        tracing::debug!(remaining_seconds = self.session.remaining_seconds, "rest resumed");
        self.emit(TimerEvent::Resumed {
            remaining_seconds: self.session.remaining_seconds,
        });
        true
    }

    /// Restores the full duration and returns to idle from any state.
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.drift.clear();
        self.session.reset();

        tracing::debug!(remaining_seconds = self.session.remaining_seconds, "rest reset");
        self.emit(TimerEvent::Reset {
            remaining_seconds: self.session.remaining_seconds,
        });
    }

    /// Leaves the countdown without completion side effects.
    pub fn skip(&mut self) {
        self.scheduler.cancel();
        self.drift.clear();
        self.session.skip();

        tracing::debug!(remaining_seconds = self.session.remaining_seconds, "rest skipped");
        self.emit(TimerEvent::Skipped);
    }

    /// Adds time to the countdown.
    ///
    /// Both the remaining and the initial duration grow by `delta_seconds`.
    /// A completed countdown is re-armed and starts ticking again.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidIncrement`] if `delta_seconds <= 0`.
    pub fn add_time(&mut self, delta_seconds: i64) -> Result<(), TimerError> {
        let delta = u64::try_from(delta_seconds)
            .ok()
            .filter(|delta| *delta > 0)
            .ok_or(TimerError::InvalidIncrement(delta_seconds))?;

        let rearmed = self.session.add_time(delta);
        if rearmed {
            self.begin_ticking(self.settings.tick_period);
        }

        tracing::debug!(
            added_seconds = delta,
            remaining_seconds = self.session.remaining_seconds,
            rearmed,
            "rest extended"
        );
        self.emit(TimerEvent::Extended {
            added_seconds: delta,
            remaining_seconds: self.session.remaining_seconds,
            initial_seconds: self.session.initial_seconds,
        });
        Ok(())
    }

    /// Replaces the duration and returns to idle as a new session.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidDuration`] if `seconds <= 0`; the
    /// session is left untouched.
    pub fn set_custom_duration(&mut self, seconds: i64) -> Result<(), TimerError> {
        let seconds_u = u64::try_from(seconds)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(TimerError::InvalidDuration(seconds))?;

        self.scheduler.cancel();
        self.drift.clear();
        self.session.set_duration(seconds_u);

        tracing::debug!(
            session_id = %self.session.id,
            seconds = seconds_u,
            "rest duration changed"
        );
        self.emit(TimerEvent::DurationChanged { seconds: seconds_u });
        Ok(())
    }

    /// Decrements the countdown by one second.
    ///
    /// Ignored unless running. Returns true if this tick completed the
    /// countdown.
    pub fn tick(&mut self) -> bool {
        if !self.session.is_running() {
            tracing::trace!(status = self.session.status.as_str(), "tick ignored");
            return false;
        }

        self.tick_anchor_millis = self.clock.now_millis();

        let completed = self.session.tick();
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.session.remaining_seconds,
        });

        if completed {
            self.complete();
        }
        completed
    }

    /// Handles a tick delivered for registration `id`.
    ///
    /// Ticks from a cancelled or replaced registration are dropped.
    pub fn handle_tick(&mut self, id: RegistrationId) -> bool {
        if !self.scheduler.is_current(id) {
            tracing::trace!(registration = %id, "stale tick dropped");
            return false;
        }
        self.tick()
    }

    /// Answers the completion prompt.
    ///
    /// # Errors
    ///
    /// Propagates [`TimerError::InvalidIncrement`] if the configured extend
    /// increment is zero.
    pub fn respond_to_prompt(&mut self, choice: PromptChoice) -> Result<(), TimerError> {
        match choice {
            PromptChoice::Extend => {
                let increment =
                    i64::try_from(self.dispatcher.extend_seconds()).unwrap_or(i64::MAX);
                self.add_time(increment)
            }
            PromptChoice::Proceed => {
                self.skip();
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Handles a suspend notification from the host.
    ///
    /// Returns true if a running countdown was marked as suspended.
    pub fn on_suspend(&mut self) -> bool {
        let now = self.clock.now_millis();
        if !self.drift.on_suspend(self.session.status, now) {
            return false;
        }

        let phase = Duration::from_millis(elapsed_millis(self.tick_anchor_millis, now));
        self.phase_at_suspend = phase.min(self.settings.tick_period);

        // No tick may land while the host is suspended
        self.scheduler.cancel();

        tracing::debug!(
            suspended_at = now,
            remaining_seconds = self.session.remaining_seconds,
            "rest suspended"
        );
        true
    }

    /// Handles a resume notification from the host.
    ///
    /// Subtracts the whole seconds spent suspended, completing the countdown
    /// immediately if it ran out. The sub-second rest, together with the
    /// tick period already used up before the suspend, shortens the delay to
    /// the next tick. Returns true if a correction was applied.
    pub fn on_resume(&mut self) -> bool {
        let now = self.clock.now_millis();
        let Some(elapsed) = self.drift.on_resume(now) else {
            return false;
        };

        if !self.session.is_running() {
            tracing::debug!(
                status = self.session.status.as_str(),
                "suspend marker discarded; countdown not running"
            );
            return false;
        }

        let next_tick = self
            .settings
            .tick_period
            .saturating_sub(self.phase_at_suspend + elapsed.leftover);
        if elapsed.seconds == 0 {
            tracing::debug!(
                leftover_millis = elapsed.leftover.as_millis() as u64,
                "resumed within the current second"
            );
            self.begin_ticking(next_tick);
            return false;
        }

        let completed = self.session.apply_elapsed(elapsed.seconds);
        tracing::debug!(
            elapsed_seconds = elapsed.seconds,
            remaining_seconds = self.session.remaining_seconds,
            "drift compensated"
        );
        self.emit(TimerEvent::DriftApplied {
            elapsed_seconds: elapsed.seconds,
            remaining_seconds: self.session.remaining_seconds,
        });

        if completed {
            self.complete();
        } else {
            self.begin_ticking(next_tick);
        }
        true
    }

    /// Routes a lifecycle signal to the matching handler.
    pub fn handle_lifecycle(&mut self, signal: LifecycleSignal) -> bool {
        match signal {
            LifecycleSignal::Suspend => self.on_suspend(),
            LifecycleSignal::Resume => self.on_resume(),
        }
    }

    // ------------------------------------------------------------------------
    // Commands and run loop
    // ------------------------------------------------------------------------

    /// Applies a command. `Shutdown` is a no-op here; the run loop handles it.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation.
    pub fn apply(&mut self, command: TimerCommand) -> Result<(), TimerError> {
        match command {
            TimerCommand::Start => {
                self.start();
            }
            TimerCommand::Pause => {
                self.pause();
            }
            TimerCommand::Resume => {
                self.resume();
            }
            TimerCommand::Reset => self.reset(),
            TimerCommand::Skip => self.skip(),
            TimerCommand::AddTime(delta) => self.add_time(delta)?,
            TimerCommand::SetCustomDuration(seconds) => self.set_custom_duration(seconds)?,
            TimerCommand::Configure(config) => self.configure(config)?,
            TimerCommand::RespondToPrompt(choice) => self.respond_to_prompt(choice)?,
            TimerCommand::Shutdown => {}
        }
        Ok(())
    }

    /// Runs the timer loop.
    ///
    /// Multiplexes tick signals, host lifecycle signals and caller commands
    /// until the command channel closes or a `Shutdown` command arrives. The
    /// tick registration is released on every exit path.
    pub async fn run(
        &mut self,
        mut ticks: mpsc::UnboundedReceiver<RegistrationId>,
        mut lifecycle: mpsc::UnboundedReceiver<LifecycleNotice>,
        mut commands: mpsc::UnboundedReceiver<TimerCommand>,
    ) {
        loop {
            tokio::select! {
                Some(id) = ticks.recv() => {
                    self.handle_tick(id);
                }
                Some(notice) = lifecycle.recv() => {
                    self.handle_lifecycle(notice.signal);
                    notice.acknowledge();
                }
                command = commands.recv() => match command {
                    Some(TimerCommand::Shutdown) | None => break,
                    Some(command) => {
                        if let Err(e) = self.apply(command) {
                            tracing::warn!(error = %e, "timer command rejected");
                            self.emit(TimerEvent::CommandRejected(e));
                        }
                    }
                },
            }
        }

        self.scheduler.cancel();
        tracing::debug!("timer loop stopped");
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn status(&self) -> TimerStatus {
        self.session.status
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.session.remaining_seconds
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.session.snapshot()
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Returns true while a tick registration is live.
    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Returns true while a suspend marker is held.
    pub fn is_suspended(&self) -> bool {
        self.drift.is_suspended()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Registers ticks with the first one due after `delay`, keeping the
    /// phase anchor in step.
    fn begin_ticking(&mut self, delay: Duration) {
        let used = self.settings.tick_period.saturating_sub(delay);
        self.tick_anchor_millis = self
            .clock
            .now_millis()
            .saturating_sub(i64::try_from(used.as_millis()).unwrap_or(i64::MAX));
        self.scheduler.begin_after(delay);
    }

    fn complete(&mut self) {
        self.scheduler.cancel();
        self.drift.clear();
        self.dispatcher.fire(&mut self.session);
    }

    fn emit(&self, event: TimerEvent) {
        emit(&self.event_tx, event);
    }
}

// ============================================================================
// Tests
// ============================================================================
