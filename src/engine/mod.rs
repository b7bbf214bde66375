//! Engine module for the rest timer.
//!
//! This module contains the countdown engine:
//! - `timer`: State machine, event types and the async run loop
//! - `scheduler`: Single-registration tick scheduling
//! - `drift`: Wall-clock reconciliation across host suspension
//! - `completion`: Exactly-once completion side effects
//! - `clock`: Wall-clock sources
//! - `error`: Engine error types

pub mod clock;
pub mod completion;
pub mod drift;
pub mod error;
pub mod scheduler;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use completion::{
    CompletionDispatcher, CompletionEvent, CompletionPrompt, HapticPattern, PromptChoice,
};
pub use drift::{BackgroundDriftCompensator, SuspendElapsed};
pub use error::TimerError;
pub use scheduler::{
    ManualTickSource, RegistrationId, TickHandle, TickScheduler, TickSource, TokioTickSource,
};
pub use timer::{LifecycleNotice, LifecycleSignal, RestTimer, TimerCommand, TimerEvent};
