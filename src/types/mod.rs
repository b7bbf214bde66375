//! Core data types for the rest timer.
//!
//! This module defines the data structures used for:
//! - Countdown state management (`TimerSession`)
//! - Rest configuration with validation
//! - Suspend bookkeeping and the serializable status snapshot

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::TimerError;

// ============================================================================
// TimerStatus
// ============================================================================

/// Represents the current state of a rest countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Configured but not counting
    #[default]
    Idle,
    /// Actively counting down
    Running,
    /// Countdown halted by the user
    Paused,
    /// Countdown reached zero
    Completed,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Completed => "completed",
        }
    }

    /// Returns true if the countdown may be started from this status.
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            TimerStatus::Idle | TimerStatus::Paused | TimerStatus::Completed
        )
    }
}

// ============================================================================
// RestConfig
// ============================================================================

/// Exercise metadata attached to a rest period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInfo {
    /// Exercise the rest follows
    pub exercise: String,
    /// Exercise coming up after the rest (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_exercise: Option<String>,
    /// Set that was just finished (1-based)
    pub set: u32,
    /// Total number of sets for the exercise
    pub total_sets: u32,
}

impl Default for ExerciseInfo {
    fn default() -> Self {
        Self {
            exercise: "Exercise".to_string(),
            next_exercise: None,
            set: 1,
            total_sets: 1,
        }
    }
}

/// Configuration for one rest period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestConfig {
    /// Countdown length in seconds (must be > 0)
    pub initial_seconds: u64,
    /// Exercise metadata
    #[serde(flatten)]
    pub info: ExerciseInfo,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            initial_seconds: 90,
            info: ExerciseInfo::default(),
        }
    }
}

impl RestConfig {
    /// Sets the countdown length.
    pub fn with_seconds(mut self, seconds: u64) -> Self {
        self.initial_seconds = seconds;
        self
    }

    /// Sets the exercise the rest follows.
    pub fn with_exercise(mut self, exercise: impl Into<String>) -> Self {
        self.info.exercise = exercise.into();
        self
    }

    /// Sets the upcoming exercise.
    pub fn with_next_exercise(mut self, next: impl Into<String>) -> Self {
        self.info.next_exercise = Some(next.into());
        self
    }

    /// Sets the set position.
    pub fn with_sets(mut self, set: u32, total_sets: u32) -> Self {
        self.info.set = set;
        self.info.total_sets = total_sets;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidDuration`] for a zero duration and
    /// [`TimerError::InvalidConfig`] for inconsistent exercise metadata.
    pub fn validate(&self) -> Result<(), TimerError> {
        if self.initial_seconds == 0 {
            return Err(TimerError::InvalidDuration(0));
        }
        if self.info.exercise.trim().is_empty() {
            return Err(TimerError::InvalidConfig(
                "exercise name must not be empty".to_string(),
            ));
        }
        if self.info.total_sets == 0 || self.info.set == 0 {
            return Err(TimerError::InvalidConfig(
                "set numbers start at 1".to_string(),
            ));
        }
        if self.info.set > self.info.total_sets {
            return Err(TimerError::InvalidConfig(format!(
                "set {} exceeds total sets {}",
                self.info.set, self.info.total_sets
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

/// Engine settings that are not part of a single rest period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    /// Interval between ticks
    pub tick_period: Duration,
    /// Seconds added by the "extend" follow-up
    pub extend_increment_seconds: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            extend_increment_seconds: 30,
        }
    }
}

// ============================================================================
// SuspendMarker
// ============================================================================

/// Wall-clock moment at which a running countdown was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendMarker {
    /// Milliseconds since the Unix epoch
    pub suspended_at_epoch_millis: i64,
}

// ============================================================================
// TimerSession
// ============================================================================

/// State of a single rest period.
///
/// All mutation goes through the transition methods below; they only touch
/// counters and status; scheduling and event side effects live in the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSession {
    /// Session identifier, regenerated for every new rest period
    pub id: Uuid,
    /// Current status
    pub status: TimerStatus,
    /// Duration the countdown started from
    pub initial_seconds: u64,
    /// Seconds left on the countdown
    pub remaining_seconds: u64,
    /// Whether completion side effects already ran
    pub completion_fired: bool,
    /// Exercise metadata
    pub info: ExerciseInfo,
}

impl TimerSession {
    /// Creates an idle session from a configuration.
    pub fn new(config: RestConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TimerStatus::Idle,
            initial_seconds: config.initial_seconds,
            remaining_seconds: config.initial_seconds,
            completion_fired: false,
            info: config.info,
        }
    }

    /// Moves to `Running`.
    ///
    /// Returns false when the session is already running. A countdown that
    /// sits at zero is refilled from `initial_seconds` and its completion
    /// guard re-armed.
    pub fn start(&mut self) -> bool {
        if !self.status.can_start() {
            return false;
        }
        if self.remaining_seconds == 0 {
            self.remaining_seconds = self.initial_seconds;
            self.completion_fired = false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Moves `Running` to `Paused`. Returns false otherwise.
    pub fn pause(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Paused;
        true
    }

    /// Moves `Paused` back to `Running`. Returns false otherwise.
    pub fn resume(&mut self) -> bool {
        if self.status != TimerStatus::Paused {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Restores the full duration and returns to `Idle`.
    pub fn reset(&mut self) {
        self.remaining_seconds = self.initial_seconds;
        self.status = TimerStatus::Idle;
        self.completion_fired = false;
    }

    /// Leaves the countdown without completing it.
    pub fn skip(&mut self) {
        self.status = TimerStatus::Idle;
    }

    /// Adds `delta` seconds to both the remaining and the initial duration.
    ///
    /// Returns true when a completed session was re-armed to `Running`.
    pub fn add_time(&mut self, delta: u64) -> bool {
        self.remaining_seconds = self.remaining_seconds.saturating_add(delta);
        self.initial_seconds = self.initial_seconds.saturating_add(delta);

        if self.status == TimerStatus::Completed && self.remaining_seconds > 0 {
            self.status = TimerStatus::Running;
            self.completion_fired = false;
            return true;
        }
        false
    }

    /// Replaces the duration and starts over as a new idle session.
    pub fn set_duration(&mut self, seconds: u64) {
        self.id = Uuid::new_v4();
        self.initial_seconds = seconds;
        self.remaining_seconds = seconds;
        self.status = TimerStatus::Idle;
        self.completion_fired = false;
    }

    /// Decrements the countdown by one second.
    ///
    /// Returns true if this tick completed the countdown. Ticks outside
    /// `Running` are ignored.
    pub fn tick(&mut self) -> bool {
        self.apply_elapsed(1)
    }

    /// Removes `elapsed` seconds from a running countdown.
    ///
    /// Returns true if the countdown reached zero and moved to `Completed`.
    pub fn apply_elapsed(&mut self, elapsed: u64) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(elapsed);
        if self.remaining_seconds == 0 {
            self.status = TimerStatus::Completed;
            return true;
        }
        false
    }

    /// Sets the completion guard.
    ///
    /// Returns true only the first time for the current countdown.
    pub fn mark_completion_fired(&mut self) -> bool {
        if self.completion_fired {
            return false;
        }
        self.completion_fired = true;
        true
    }

    /// Returns true if the countdown is active.
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Returns true if the countdown is paused.
    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// Share of the countdown already elapsed, in percent.
    pub fn percent_complete(&self) -> f64 {
        if self.initial_seconds == 0 {
            return 0.0;
        }
        let done = self.initial_seconds.saturating_sub(self.remaining_seconds) as f64;
        (done / self.initial_seconds as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Builds the serializable read model.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            session_id: Some(self.id),
            state: self.status,
            remaining_seconds: self.remaining_seconds,
            initial_seconds: self.initial_seconds,
            percent_complete: self.percent_complete(),
            exercise: self.info.exercise.clone(),
            next_exercise: self.info.next_exercise.clone(),
            set: self.info.set,
            total_sets: self.info.total_sets,
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Point-in-time view of a session for status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Absent for a rest that has not been created yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub state: TimerStatus,
    pub remaining_seconds: u64,
    pub initial_seconds: u64,
    pub percent_complete: f64,
    pub exercise: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_exercise: Option<String>,
    pub set: u32,
    pub total_sets: u32,
}

// ============================================================================
// Tests
// ============================================================================
