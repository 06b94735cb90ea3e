//! Notification dispatch.
//!
//! [`Notifier::dispatch`] receives the alerts judged new in one sync attempt
//! and posts one notification per alert, keyed by alert identity. A failure
//! for one alert never prevents the rest of the batch from being attempted.

pub mod location;
pub mod render;
pub mod sink;

pub use location::{FixedLocation, GeoPoint, LocationProvider, NoLocation, locate_within};
pub use render::{Notification, NotificationAction, render};
pub use sink::{ChannelSink, LogSink, MemorySink, NotificationSink};

use crate::alert::AlertRecord;
use crate::config::NotifyConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-batch delivery result, by alert identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers user-visible notifications for new alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, alerts: &[AlertRecord]) -> DispatchReport;
}

/// Renders alerts (with optional distance chips) and posts them to a sink.
pub struct RenderingNotifier {
    sink: Arc<dyn NotificationSink>,
    location: Arc<dyn LocationProvider>,
    location_timeout: Duration,
    per_alert_budget: Duration,
}

impl RenderingNotifier {
    /// Create a notifier without a location source.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        let defaults = NotifyConfig::default();
        Self {
            sink,
            location: Arc::new(NoLocation),
            location_timeout: defaults.location_timeout(),
            per_alert_budget: defaults.per_alert_budget(),
        }
    }

    /// Annotate notifications with distance from `location`.
    #[must_use]
    pub fn with_location(mut self, location: Arc<dyn LocationProvider>) -> Self {
        self.location = location;
        self
    }

    /// Apply timeouts from configuration.
    #[must_use]
    pub fn with_config(mut self, config: &NotifyConfig) -> Self {
        self.location_timeout = config.location_timeout();
        self.per_alert_budget = config.per_alert_budget();
        self
    }
}

#[async_trait]
impl Notifier for RenderingNotifier {
    async fn dispatch(&self, alerts: &[AlertRecord]) -> DispatchReport {
        let mut report = DispatchReport::default();
        if alerts.is_empty() {
            return report;
        }

        let user = locate_within(self.location.as_ref(), self.location_timeout).await;
        debug!(has_location = user.is_some(), count = alerts.len(), "dispatching notifications");

        for alert in alerts {
            let notification = render(alert, user);
            let key = notification.key.clone();
            match tokio::time::timeout(self.per_alert_budget, self.sink.post(notification)).await {
                Ok(Ok(())) => report.delivered.push(key),
                Ok(Err(e)) => {
                    warn!(identity = %key, error = %e, "notification post failed");
                    report.failed.push(key);
                }
                Err(_) => {
                    warn!(identity = %key, "notification post exceeded its time budget");
                    report.failed.push(key);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::{AlertError, Result};

    /// Rejects alerts whose title contains "bad".
    struct PickySink {
        inner: MemorySink,
    }

    #[async_trait]
    impl NotificationSink for PickySink {
        async fn post(&self, notification: Notification) -> Result<()> {
            if notification.title.contains("bad") {
                return Err(AlertError::Notify("render failed".into()));
            }
            self.inner.post(notification).await
        }
    }

    struct StuckSink;

    #[async_trait]
    impl NotificationSink for StuckSink {
        async fn post(&self, _notification: Notification) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let sink = Arc::new(PickySink {
            inner: MemorySink::new(),
        });
        let notifier = RenderingNotifier::new(sink.clone());
        let alerts = vec![
            AlertRecord::new("good one", 0.0, 0.0),
            AlertRecord::new("bad one", 0.0, 0.0),
            AlertRecord::new("good two", 0.0, 0.0),
        ];

        let report = notifier.dispatch(&alerts).await;
        assert_eq!(report.delivered, vec!["good one|", "good two|"]);
        assert_eq!(report.failed, vec!["bad one|"]);
        assert!(!report.all_delivered());
        assert_eq!(sink.inner.shown().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_post_is_bounded_by_budget() {
        let notifier = RenderingNotifier::new(Arc::new(StuckSink));
        let report = notifier
            .dispatch(&[AlertRecord::new("slow", 0.0, 0.0)])
            .await;
        assert_eq!(report.failed, vec!["slow|"]);
    }

    #[tokio::test]
    async fn location_adds_distance_chips() {
        let sink = Arc::new(MemorySink::new());
        let notifier = RenderingNotifier::new(sink.clone())
            .with_location(Arc::new(FixedLocation(GeoPoint::new(49.74, 8.62))));
        notifier
            .dispatch(&[AlertRecord::new("Raid", 49.75, 8.62).with_category("Raid")])
            .await;
        assert_eq!(sink.shown()[0].body, "1.1 km • 14 min walk • Raid");
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let sink = Arc::new(MemorySink::new());
        let report = RenderingNotifier::new(sink.clone()).dispatch(&[]).await;
        assert_eq!(report, DispatchReport::default());
        assert_eq!(sink.post_count(), 0);
    }
}
