//! Rest Timer Library
//!
//! This library provides a countdown engine for the rest between training
//! sets. It includes:
//! - Timer state machine with an async run loop
//! - Single-registration tick scheduling
//! - Wall-clock drift compensation across host suspension
//! - Exactly-once completion dispatch (event, haptic cue, follow-up prompt)
//! - CLI command parsing and display utilities
//! - Type definitions for configuration and state

pub mod cli;
pub mod engine;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ExerciseInfo, RestConfig, SuspendMarker, TimerSession, TimerSettings, TimerSnapshot,
    TimerStatus,
};

pub use engine::{
    BackgroundDriftCompensator, Clock, CompletionDispatcher, CompletionEvent, CompletionPrompt,
    HapticPattern, LifecycleNotice, LifecycleSignal, ManualClock, ManualTickSource, PromptChoice,
    RegistrationId, RestTimer, SystemClock, TickScheduler, TickSource, TimerCommand, TimerError,
    TimerEvent, TokioTickSource,
};
