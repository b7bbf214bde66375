//! Background drift compensation.
//!
//! Hosts stop delivering ticks while the process is suspended, so the
//! countdown would otherwise freeze for the length of the suspension. The
//! compensator remembers when a running countdown was suspended and, on
//! resume, reports how many whole seconds of wall-clock time passed.

use std::time::Duration;

use crate::types::{SuspendMarker, TimerStatus};

/// Wall-clock time spent suspended, split into whole seconds and the
/// sub-second rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendElapsed {
    pub seconds: u64,
    /// Part of the current second already used up while suspended
    pub leftover: Duration,
}

/// Tracks the suspend marker for the current session.
#[derive(Debug, Default)]
pub struct BackgroundDriftCompensator {
    marker: Option<SuspendMarker>,
}

impl BackgroundDriftCompensator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a suspend notification.
    ///
    /// Records `now_millis` only when the countdown is running. A repeated
    /// suspend keeps the earliest marker. Returns true if a marker was
    /// recorded by this call.
    pub fn on_suspend(&mut self, status: TimerStatus, now_millis: i64) -> bool {
        if status != TimerStatus::Running || self.marker.is_some() {
            return false;
        }
        self.marker = Some(SuspendMarker {
            suspended_at_epoch_millis: now_millis,
        });
        true
    }

    /// Handles a resume notification.
    ///
    /// Consumes the marker and returns the time spent suspended, or `None`
    /// when nothing was recorded (e.g. the timer was paused).
    pub fn on_resume(&mut self, now_millis: i64) -> Option<SuspendElapsed> {
        let marker = self.marker.take()?;
        let millis = elapsed_millis(marker.suspended_at_epoch_millis, now_millis);
        Some(SuspendElapsed {
            seconds: millis / 1000,
            leftover: Duration::from_millis(millis % 1000),
        })
    }

    /// Drops the marker without reconciling.
    ///
    /// Returns true if a marker was held.
    pub fn clear(&mut self) -> bool {
        self.marker.take().is_some()
    }

    pub fn marker(&self) -> Option<SuspendMarker> {
        self.marker
    }

    pub fn is_suspended(&self) -> bool {
        self.marker.is_some()
    }
}

/// Whole seconds between two epoch-millisecond instants, floored.
///
/// A clock that moved backwards yields 0.
pub fn elapsed_seconds(from_millis: i64, to_millis: i64) -> u64 {
    elapsed_millis(from_millis, to_millis) / 1000
}

/// Milliseconds between two epoch-millisecond instants, clamped at 0.
pub fn elapsed_millis(from_millis: i64, to_millis: i64) -> u64 {
    let diff = to_millis.saturating_sub(from_millis);
    if diff < 0 {
        tracing::warn!(
            skew_millis = diff,
            "wall clock moved backwards while suspended; treating elapsed time as 0"
        );
        return 0;
    }
    diff as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    mod elapsed_tests {
        use super::*;

        #[test]
        fn test_floors_partial_seconds() {
            assert_eq!(elapsed_seconds(0, 999), 0);
            assert_eq!(elapsed_seconds(0, 1_000), 1);
            assert_eq!(elapsed_seconds(500, 10_499), 9);
        }

        #[test]
        fn test_negative_is_clamped() {
            assert_eq!(elapsed_seconds(10_000, 4_000), 0);
            assert_eq!(elapsed_millis(10_000, 4_000), 0);
        }

        #[test]
        fn test_elapsed_millis() {
            assert_eq!(elapsed_millis(1_000, 1_999), 999);
        }

        #[test]
        fn test_extreme_values_do_not_overflow() {
            assert_eq!(elapsed_seconds(i64::MAX, i64::MIN), 0);
            assert_eq!(elapsed_seconds(i64::MIN, i64::MAX), (i64::MAX / 1000) as u64);
        }
    }

    mod compensator_tests {
        use super::*;

        #[test]
        fn test_suspend_while_running_records_marker() {
            let mut drift = BackgroundDriftCompensator::new();

            assert!(drift.on_suspend(TimerStatus::Running, 1_000));
            assert!(drift.is_suspended());
            assert_eq!(
                drift.marker(),
                Some(SuspendMarker {
                    suspended_at_epoch_millis: 1_000
                })
            );
        }

        #[test]
        fn test_suspend_while_not_running_is_ignored() {
            let mut drift = BackgroundDriftCompensator::new();

            for status in [
                TimerStatus::Idle,
                TimerStatus::Paused,
                TimerStatus::Completed,
            ] {
                assert!(!drift.on_suspend(status, 1_000));
                assert!(!drift.is_suspended());
            }
        }

        #[test]
        fn test_repeated_suspend_keeps_earliest() {
            let mut drift = BackgroundDriftCompensator::new();
            drift.on_suspend(TimerStatus::Running, 1_000);
            assert!(!drift.on_suspend(TimerStatus::Running, 9_000));

            assert_eq!(drift.on_resume(11_000).map(|e| e.seconds), Some(10));
        }

        #[test]
        fn test_resume_consumes_marker() {
            let mut drift = BackgroundDriftCompensator::new();
            drift.on_suspend(TimerStatus::Running, 0);

            assert_eq!(
                drift.on_resume(50_000),
                Some(SuspendElapsed {
                    seconds: 50,
                    leftover: Duration::ZERO,
                })
            );
            assert!(!drift.is_suspended());
            assert_eq!(drift.on_resume(60_000), None);
        }

        #[test]
        fn test_resume_reports_leftover_millis() {
            let mut drift = BackgroundDriftCompensator::new();
            drift.on_suspend(TimerStatus::Running, 1_000);

            let elapsed = drift.on_resume(3_750).unwrap();
            assert_eq!(elapsed.seconds, 2);
            assert_eq!(elapsed.leftover, Duration::from_millis(750));
        }

        #[test]
        fn test_resume_without_marker() {
            let mut drift = BackgroundDriftCompensator::new();
            assert_eq!(drift.on_resume(1_000), None);
        }

        #[test]
        fn test_clear() {
            let mut drift = BackgroundDriftCompensator::new();
            assert!(!drift.clear());
            drift.on_suspend(TimerStatus::Running, 0);
            assert!(drift.clear());
            assert_eq!(drift.on_resume(5_000), None);
        }
    }
}
