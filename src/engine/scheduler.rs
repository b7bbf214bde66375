//! Tick scheduling for the rest countdown.
//!
//! The scheduler owns at most one tick registration at a time. Starting a
//! new registration always cancels the previous one first, and every tick
//! delivered through the channel is tagged with its [`RegistrationId`] so
//! that ticks queued by a cancelled registration can be recognised and
//! dropped by the engine.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

// ============================================================================
// RegistrationId
// ============================================================================

/// Identifier of one tick registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// TickHandle
// ============================================================================

/// Owned handle to a live registration. Dropping it stops the ticks.
#[derive(Debug, Default)]
pub struct TickHandle {
    task: Option<JoinHandle<()>>,
    live: Option<Arc<AtomicUsize>>,
}

impl TickHandle {
    /// Handle with nothing behind it; the host delivers ticks itself.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Handle owning a spawned ticker task.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self {
            task: Some(task),
            live: None,
        }
    }

    fn counted(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            task: None,
            live: Some(live),
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// TickSource
// ============================================================================

/// Something that can deliver periodic ticks for a registration.
pub trait TickSource: Send {
    /// Begins delivering ticks for `id`: the first after `delay`, then
    /// every `period`.
    fn register(&mut self, id: RegistrationId, delay: Duration, period: Duration) -> TickHandle;
}

/// Tick source backed by a tokio interval task per registration.
///
/// Ticks arrive on the receiver returned by [`TokioTickSource::channel`].
#[derive(Debug, Clone)]
pub struct TokioTickSource {
    tx: mpsc::UnboundedSender<RegistrationId>,
}

impl TokioTickSource {
    pub fn new(tx: mpsc::UnboundedSender<RegistrationId>) -> Self {
        Self { tx }
    }

    /// Creates a source together with the receiving end of its tick channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RegistrationId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TickSource for TokioTickSource {
    fn register(&mut self, id: RegistrationId, delay: Duration, period: Duration) -> TickHandle {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if tx.send(id).is_err() {
                    break;
                }
            }
        });
        TickHandle::from_task(task)
    }
}

/// Tick source that spawns nothing; the caller drives `tick()` by hand.
///
/// Clones share their counters so tests can observe registrations made by
/// an engine that owns another clone.
#[derive(Debug, Clone, Default)]
pub struct ManualTickSource {
    registrations: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    last_delay_millis: Arc<AtomicU64>,
}

impl ManualTickSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total registrations ever created.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Registrations whose handle has not been dropped yet.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// First-tick delay of the most recent registration.
    #[must_use]
    pub fn last_delay(&self) -> Duration {
        Duration::from_millis(self.last_delay_millis.load(Ordering::SeqCst))
    }
}

impl TickSource for ManualTickSource {
    fn register(&mut self, _id: RegistrationId, delay: Duration, _period: Duration) -> TickHandle {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        let delay_millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.last_delay_millis.store(delay_millis, Ordering::SeqCst);
        TickHandle::counted(self.live.clone())
    }
}

// ============================================================================
// TickScheduler
// ============================================================================

/// Owns the single active tick registration.
pub struct TickScheduler {
    source: Box<dyn TickSource>,
    period: Duration,
    next_id: u64,
    active: Option<(RegistrationId, TickHandle)>,
}

impl TickScheduler {
    pub fn new(source: Box<dyn TickSource>, period: Duration) -> Self {
        Self {
            source,
            period,
            next_id: 0,
            active: None,
        }
    }

    /// Cancels any existing registration and creates a fresh one.
    pub fn begin(&mut self) -> RegistrationId {
        self.begin_after(self.period)
    }

    /// Like [`begin`](Self::begin), with the first tick due after `delay`
    /// instead of a full period.
    pub fn begin_after(&mut self, delay: Duration) -> RegistrationId {
        self.cancel();

        self.next_id += 1;
        let id = RegistrationId(self.next_id);
        let handle = self.source.register(id, delay, self.period);
        self.active = Some((id, handle));

        tracing::debug!(
            registration = %id,
            delay_millis = delay.as_millis() as u64,
            "tick registration created"
        );
        id
    }

    /// Cancels the active registration, if any.
    ///
    /// Returns true if a registration was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some((id, handle)) => {
                drop(handle);
                tracing::debug!(registration = %id, "tick registration cancelled");
                true
            }
            None => false,
        }
    }

    /// Returns true while a registration is live.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Returns true if `id` names the live registration.
    pub fn is_current(&self, id: RegistrationId) -> bool {
        self.active_registration() == Some(id)
    }

    pub fn active_registration(&self) -> Option<RegistrationId> {
        self.active.as_ref().map(|(id, _)| *id)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickScheduler")
            .field("period", &self.period)
            .field("active", &self.active_registration())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
