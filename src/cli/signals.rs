//! Job-control signal forwarding.
//!
//! Maps SIGTSTP (Ctrl-Z) to [`LifecycleSignal::Suspend`] and SIGCONT to
//! [`LifecycleSignal::Resume`], so time spent stopped is reconciled against
//! the wall clock when the process continues.

use std::os::raw::c_int;

use futures::stream::StreamExt;
use signal_hook::consts::{SIGCONT, SIGTSTP};
use signal_hook_tokio::{Handle, Signals};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::engine::{LifecycleNotice, LifecycleSignal};

/// Running signal forwarder. Dropping it stops forwarding.
pub struct SignalForwarder {
    handle: Handle,
    task: JoinHandle<()>,
}

impl SignalForwarder {
    /// Installs the handlers and starts forwarding to `tx`.
    pub fn spawn(tx: mpsc::UnboundedSender<LifecycleNotice>) -> std::io::Result<Self> {
        let signals = Signals::new([SIGTSTP, SIGCONT])?;
        let handle = signals.handle();
        let task = tokio::spawn(forward(signals, tx));
        Ok(Self { handle, task })
    }
}

impl Drop for SignalForwarder {
    fn drop(&mut self) {
        self.handle.close();
        self.task.abort();
    }
}

/// Builds the notice for a received signal.
///
/// A suspend notice comes with the receiver of its acknowledgement. Signals
/// other than SIGTSTP and SIGCONT yield `None`.
fn notice_for(signal: c_int) -> Option<(LifecycleNotice, Option<oneshot::Receiver<()>>)> {
    match signal {
        SIGTSTP => {
            let (notice, ack) = LifecycleNotice::with_ack(LifecycleSignal::Suspend);
            Some((notice, Some(ack)))
        }
        SIGCONT => Some((LifecycleSignal::Resume.into(), None)),
        _ => None,
    }
}

async fn forward(mut signals: Signals, tx: mpsc::UnboundedSender<LifecycleNotice>) {
    while let Some(signal) = signals.next().await {
        let Some((notice, ack)) = notice_for(signal) else {
            tracing::debug!(signal, "ignoring signal");
            continue;
        };
        tracing::info!(signal, lifecycle = ?notice.signal, "forwarding job-control signal");

        if tx.send(notice).is_err() {
            tracing::debug!("lifecycle receiver dropped; stopping signal forwarding");
            break;
        }

        if let Some(ack) = ack {
            // The marker must be recorded before the process actually stops.
            let _ = ack.await;
            if let Err(e) = signal_hook::low_level::emulate_default_handler(SIGTSTP) {
                tracing::warn!(error = %e, "failed to stop process");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
