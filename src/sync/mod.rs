//! One sync attempt: fetch, diff against the seen store, notify, commit.
//!
//! Every failure inside an attempt is folded into an [`Outcome`]; nothing
//! propagates to the scheduler as an error.
//!
//! Notifications are dispatched *before* the new identities are committed.
//! A crash between the two re-notifies on the next attempt, which the
//! identity-keyed notification surface turns into an overwrite
//! (at-least-once delivery).

use crate::alert::AlertRecord;
use crate::feed::RemoteFeed;
use crate::notify::Notifier;
use crate::store::{SeenIds, SeenStore};
use crate::surface::{NoopRefresher, SurfaceRefresher};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Attempts per fire before the fire is reported as [`Outcome::Fail`].
pub const MAX_RETRIES: u32 = 3;

/// Result of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// Transient failure; the caller may try again with `attempt + 1`.
    Retry,
    /// Terminal for this fire only. The next fire starts over at attempt 1.
    Fail,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Retry => write!(f, "retry"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Record of one attempt, reported to surfaces and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncAttempt {
    pub attempt: u32,
    pub outcome: Outcome,
    /// Alerts judged new, in feed order.
    pub new_alerts: Vec<AlertRecord>,
}

/// Drives the fetch → diff → notify → commit pipeline.
pub struct SyncEngine {
    feed: Arc<dyn RemoteFeed>,
    store: Arc<dyn SeenStore>,
    notifier: Arc<dyn Notifier>,
    refresher: Arc<dyn SurfaceRefresher>,
    max_retries: u32,
}

impl SyncEngine {
    pub fn new(
        feed: Arc<dyn RemoteFeed>,
        store: Arc<dyn SeenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            feed,
            store,
            notifier,
            refresher: Arc::new(NoopRefresher),
            max_retries: MAX_RETRIES,
        }
    }

    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn SurfaceRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    /// Override the attempt budget (at least one).
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run attempt number `attempt` (1-based) and return its outcome.
    pub async fn run(&self, attempt: u32) -> Outcome {
        self.run_attempt(attempt).await.outcome
    }

    /// Like [`run`](Self::run), also returning the alerts judged new.
    pub async fn run_attempt(&self, attempt: u32) -> SyncAttempt {
        let result = self.execute(attempt).await;
        info!(
            attempt,
            outcome = %result.outcome,
            new_alerts = result.new_alerts.len(),
            "sync attempt finished"
        );
        self.refresher.notify(&result);
        result
    }

    fn retry_or_fail(&self, attempt: u32) -> Outcome {
        if attempt < self.max_retries {
            Outcome::Retry
        } else {
            Outcome::Fail
        }
    }

    async fn execute(&self, attempt: u32) -> SyncAttempt {
        let finished = |outcome, new_alerts| SyncAttempt {
            attempt,
            outcome,
            new_alerts,
        };

        let fetched = match self.feed.fetch().await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(attempt, error = %e, "feed fetch failed");
                return finished(self.retry_or_fail(attempt), Vec::new());
            }
        };
        if fetched.is_empty() {
            debug!(attempt, "feed returned no alerts");
            return finished(Outcome::Success, Vec::new());
        }

        let seen = match self.store.get() {
            Ok(seen) => seen,
            Err(e) => {
                warn!(attempt, error = %e, "seen store read failed");
                return finished(self.retry_or_fail(attempt), Vec::new());
            }
        };

        let new_alerts = diff_new_alerts(&fetched, &seen);
        if new_alerts.is_empty() {
            debug!(attempt, fetched = fetched.len(), "no new alerts");
            return finished(Outcome::Success, new_alerts);
        }

        let report = self.notifier.dispatch(&new_alerts).await;
        if !report.all_delivered() {
            warn!(
                attempt,
                failed = report.failed.len(),
                delivered = report.delivered.len(),
                "some notifications were not delivered"
            );
        }

        let ids: Vec<String> = new_alerts
            .iter()
            .map(|a| a.identity().into_string())
            .collect();
        if let Err(e) = self.store.commit(&ids) {
            // Delivered alerts may be re-notified by a later attempt.
            error!(attempt, error = %e, "failed to commit seen identities");
        }

        finished(Outcome::Success, new_alerts)
    }
}

/// Alerts in `fetched` whose identity is not in `seen`, in feed order.
///
/// Repeated identities within one batch are reported once (first wins).
#[must_use]
pub fn diff_new_alerts(fetched: &[AlertRecord], seen: &SeenIds) -> Vec<AlertRecord> {
    let mut batch = HashSet::new();
    fetched
        .iter()
        .filter(|alert| {
            let id = alert.identity().into_string();
            !seen.contains(&id) && batch.insert(id)
        })
        .cloned()
        .collect()
}
