//! Completion dispatch.
//!
//! A countdown can reach zero from two places: the tick path and the
//! drift-reconciliation path on resume. Both call
//! [`CompletionDispatcher::fire`]; the session's `completion_fired` guard makes
//! every call after the first a no-op.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::TimerSession;

use super::timer::{emit, TimerEvent};

// ============================================================================
// Event payloads
// ============================================================================

/// Structured record of a finished rest period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub session_id: Uuid,
    pub exercise: String,
    pub set: u32,
    pub total_sets: u32,
    /// Full rest length, including any extensions
    pub elapsed_rest_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_exercise: Option<String>,
}

impl CompletionEvent {
    pub fn from_session(session: &TimerSession) -> Self {
        Self {
            session_id: session.id,
            exercise: session.info.exercise.clone(),
            set: session.info.set,
            total_sets: session.info.total_sets,
            elapsed_rest_seconds: session.initial_seconds,
            next_exercise: session.info.next_exercise.clone(),
        }
    }
}

/// Kind of haptic feedback the presentation layer should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticPattern {
    /// Rest period finished
    RestComplete,
}

impl HapticPattern {
    /// Alternating off/on durations in milliseconds, starting with a pause.
    pub fn pattern_millis(&self) -> &'static [u64] {
        match self {
            HapticPattern::RestComplete => &[0, 500, 200, 500],
        }
    }
}

/// "Rest complete" prompt with its follow-up offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPrompt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_exercise: Option<String>,
    pub offer_extend: bool,
    /// Seconds the extend follow-up adds
    pub extend_seconds: u64,
}

/// Answer to a [`CompletionPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// Add the fixed increment and keep resting
    Extend,
    /// Move on to the next exercise
    Proceed,
}

// ============================================================================
// CompletionDispatcher
// ============================================================================

/// Fires completion side effects at most once per countdown.
#[derive(Debug, Clone)]
pub struct CompletionDispatcher {
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    extend_seconds: u64,
}

impl CompletionDispatcher {
    pub fn new(event_tx: mpsc::UnboundedSender<TimerEvent>, extend_seconds: u64) -> Self {
        Self {
            event_tx,
            extend_seconds,
        }
    }

    /// Runs completion side effects for `session`.
    ///
    /// Returns false without doing anything if they already ran for this
    /// countdown.
    pub fn fire(&self, session: &mut TimerSession) -> bool {
        if !session.mark_completion_fired() {
            tracing::debug!(session_id = %session.id, "duplicate completion ignored");
            return false;
        }

        let event = CompletionEvent::from_session(session);
        tracing::info!(
            session_id = %event.session_id,
            exercise = %event.exercise,
            set = event.set,
            total_sets = event.total_sets,
            elapsed_rest_seconds = event.elapsed_rest_seconds,
            next_exercise = ?event.next_exercise,
            "rest period complete"
        );

        let prompt = CompletionPrompt {
            next_exercise: event.next_exercise.clone(),
            offer_extend: true,
            extend_seconds: self.extend_seconds,
        };

        emit(&self.event_tx, TimerEvent::RestCompleted(event));
        emit(
            &self.event_tx,
            TimerEvent::HapticRequested(HapticPattern::RestComplete),
        );
        emit(&self.event_tx, TimerEvent::CompletionPromptRequested(prompt));
        true
    }

    pub fn extend_seconds(&self) -> u64 {
        self.extend_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RestConfig;

    fn completed_session() -> TimerSession {
        let mut session = TimerSession::new(
            RestConfig::default()
                .with_seconds(60)
                .with_exercise("Bench Press")
                .with_next_exercise("Incline Press")
                .with_sets(2, 4),
        );
        session.start();
        session.apply_elapsed(60);
        session
    }

    #[test]
    fn test_fire_emits_event_haptic_and_prompt() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = CompletionDispatcher::new(tx, 30);
        let mut session = completed_session();

        assert!(dispatcher.fire(&mut session));
        assert!(session.completion_fired);

        match rx.try_recv().unwrap() {
            TimerEvent::RestCompleted(event) => {
                assert_eq!(event.session_id, session.id);
                assert_eq!(event.exercise, "Bench Press");
                assert_eq!(event.set, 2);
                assert_eq!(event.total_sets, 4);
                assert_eq!(event.elapsed_rest_seconds, 60);
                assert_eq!(event.next_exercise.as_deref(), Some("Incline Press"));
            }
            other => panic!("Expected RestCompleted, got {:?}", other),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            TimerEvent::HapticRequested(HapticPattern::RestComplete)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            TimerEvent::CompletionPromptRequested(CompletionPrompt {
                next_exercise: Some("Incline Press".to_string()),
                offer_extend: true,
                extend_seconds: 30,
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_second_fire_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = CompletionDispatcher::new(tx, 30);
        let mut session = completed_session();

        assert!(dispatcher.fire(&mut session));
        while rx.try_recv().is_ok() {}

        assert!(!dispatcher.fire(&mut session));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_fire_with_closed_channel_still_sets_guard() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let dispatcher = CompletionDispatcher::new(tx, 15);
        let mut session = completed_session();

        assert!(dispatcher.fire(&mut session));
        assert!(session.completion_fired);
        assert!(!dispatcher.fire(&mut session));
    }

    #[test]
    fn test_completion_event_serializes_camel_case() {
        let event = CompletionEvent::from_session(&completed_session());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"elapsedRestSeconds\":60"));
        assert!(json.contains("\"totalSets\":4"));
        assert!(json.contains("\"nextExercise\":\"Incline Press\""));
    }

    #[test]
    fn test_haptic_pattern() {
        assert_eq!(HapticPattern::RestComplete.pattern_millis().len(), 4);
    }
}
