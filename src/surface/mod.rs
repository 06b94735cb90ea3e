//! Refresh hooks for secondary read-only views (widgets, status panels).
//!
//! The sync engine calls [`SurfaceRefresher::notify`] after every attempt,
//! whatever its outcome. Refreshers never own alert state; consumers re-pull
//! the feed themselves. Delivery is best-effort with no retry.

pub mod summary;

pub use summary::{AlertSummary, SummaryRow, SummarySurface};

use crate::sync::{Outcome, SyncAttempt};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the broadcast buffer; slow receivers skip older events.
const EVENT_BUFFER: usize = 16;

/// Hook invoked once per completed sync attempt.
pub trait SurfaceRefresher: Send + Sync {
    fn notify(&self, attempt: &SyncAttempt);
}

/// Refresher for hosts without secondary surfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefresher;

impl SurfaceRefresher for NoopRefresher {
    fn notify(&self, _attempt: &SyncAttempt) {}
}

/// What a surface learns about a finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceEvent {
    pub outcome: Outcome,
    pub new_alerts: usize,
    pub at: DateTime<Utc>,
}

/// Broadcasts a [`SurfaceEvent`] to every subscribed surface.
#[derive(Debug, Clone)]
pub struct BroadcastRefresher {
    tx: broadcast::Sender<SurfaceEvent>,
}

impl BroadcastRefresher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceRefresher for BroadcastRefresher {
    fn notify(&self, attempt: &SyncAttempt) {
        let event = SurfaceEvent {
            outcome: attempt.outcome,
            new_alerts: attempt.new_alerts.len(),
            at: Utc::now(),
        };
        // No subscribers is fine.
        if self.tx.send(event).is_err() {
            trace!("no surface subscribers");
        }
    }
}
