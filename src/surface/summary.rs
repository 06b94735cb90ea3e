//! Compact "latest alerts" view rebuilt after each sync attempt.

use super::SurfaceEvent;
use crate::alert::AlertRecord;
use crate::error::Result;
use crate::feed::RemoteFeed;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Rows shown by the summary.
pub const SUMMARY_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub key: String,
    pub title: String,
    pub subtitle: String,
}

/// Snapshot rendered by a summary surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSummary {
    pub rows: Vec<SummaryRow>,
    /// Local wall-clock time of the rebuild, `HH:MM:SS`.
    pub updated_at: String,
}

impl AlertSummary {
    /// Top [`SUMMARY_ROWS`] alerts ordered by raw end time, latest first.
    #[must_use]
    pub fn build(alerts: &[AlertRecord], now: DateTime<Local>) -> Self {
        let mut sorted: Vec<&AlertRecord> = alerts.iter().collect();
        sorted.sort_by(|a, b| b.end_time.cmp(&a.end_time));

        let rows = sorted
            .into_iter()
            .take(SUMMARY_ROWS)
            .map(|alert| SummaryRow {
                key: alert.identity().into_string(),
                title: alert.display_name.clone(),
                subtitle: subtitle(alert),
            })
            .collect();

        Self {
            rows,
            updated_at: now.format("%H:%M:%S").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn subtitle(alert: &AlertRecord) -> String {
    match alert.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => {
            if alert.end_time.trim().is_empty() {
                category.to_owned()
            } else {
                format!("{category} · Ends: {}", alert.end_time)
            }
        }
        _ => alert.description.clone(),
    }
}

/// Re-pulls the feed on refresh events and publishes the latest summary.
pub struct SummarySurface {
    feed: Arc<dyn RemoteFeed>,
    tx: watch::Sender<AlertSummary>,
}

impl SummarySurface {
    pub fn new(feed: Arc<dyn RemoteFeed>) -> Self {
        let (tx, _) = watch::channel(AlertSummary::default());
        Self { feed, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertSummary> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> AlertSummary {
        self.tx.borrow().clone()
    }

    /// Fetch the feed and publish a fresh summary.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previously published summary is kept.
    pub async fn refresh(&self) -> Result<()> {
        let alerts = self.feed.fetch().await?;
        let summary = AlertSummary::build(&alerts, Local::now());
        debug!(rows = summary.rows.len(), "summary rebuilt");
        self.tx.send_replace(summary);
        Ok(())
    }

    /// Refresh on every event until `cancel` fires or the sender goes away.
    pub fn spawn(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SurfaceEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = events.recv() => received,
                };
                match received {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Err(e) = self.refresh().await {
                            warn!(error = %e, "summary refresh failed, keeping previous");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
