//! Error types for the rest timer engine.
//!
//! Every error here is local and recoverable: the session is left exactly as
//! it was before the rejected call.

use thiserror::Error;

/// Errors returned by timer operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimerError {
    /// Duration was zero or negative.
    #[error("invalid rest duration: {0} seconds (must be greater than 0)")]
    InvalidDuration(i64),

    /// Extension amount was zero or negative.
    #[error("invalid time increment: {0} seconds (must be greater than 0)")]
    InvalidIncrement(i64),

    /// Exercise metadata is inconsistent.
    #[error("invalid rest configuration: {0}")]
    InvalidConfig(String),
}

impl TimerError {
    /// Returns true if the caller should ask the user for a new duration.
    #[must_use]
    pub fn should_reprompt(&self) -> bool {
        matches!(self, Self::InvalidDuration(_) | Self::InvalidIncrement(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimerError::InvalidDuration(-5);
        assert!(err.to_string().contains("-5 seconds"));

        let err = TimerError::InvalidIncrement(0);
        assert!(err.to_string().contains("increment"));

        let err = TimerError::InvalidConfig("bad set".to_string());
        assert!(err.to_string().contains("bad set"));
    }

    #[test]
    fn test_should_reprompt() {
        assert!(TimerError::InvalidDuration(0).should_reprompt());
        assert!(TimerError::InvalidIncrement(-1).should_reprompt());
        assert!(!TimerError::InvalidConfig("x".into()).should_reprompt());
    }
}
