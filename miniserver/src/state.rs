
use std::fmt;
use std::time::Duration;

use tokio::sync::watch;

/// Lifecycle state of the miniserver.
///
/// Valid transitions are `Idle → Running` (via start) and
/// `Running → Stopping → Idle` (via stop and event-loop exit).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MiniServerState {
    /// The miniserver is not running.
    Idle,

    /// The event loop is serving sockets.
    Running,

    /// A stop was requested; the event loop has not exited yet.
    Stopping,
}

impl Default for MiniServerState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for MiniServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        };
        write!(f, "{s}")
    }
}

/// Single shared state cell.
///
/// A watch channel gives sequentially consistent reads plus the wakeups the
/// startup barrier and the stop loop block on.
pub(crate) struct StateCell {
    tx: watch::Sender<MiniServerState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(MiniServerState::Idle);
        StateCell { tx }
    }

    pub(crate) fn get(&self) -> MiniServerState {
        *self.tx.borrow()
    }

    pub(crate) fn set(&self, state: MiniServerState) {
        let old = self.tx.send_replace(state);
        if old != state {
            log::debug!("miniserver state {old} -> {state}");
        }
    }

    /// Guarded transition; returns false and leaves the state untouched if
    /// the current state is not `from`.
    pub(crate) fn transition(&self, from: MiniServerState, to: MiniServerState) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            log::debug!("miniserver state {from} -> {to}");
        }
        changed
    }

    /// Waits until the state equals `target`, up to `deadline`. Returns
    /// whether the target was reached.
    pub(crate) async fn wait_for(&self, target: MiniServerState, deadline: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        let result = tokio::time::timeout(deadline, rx.wait_for(|s| *s == target)).await;
        matches!(result, Ok(Ok(_)))
    }
}
