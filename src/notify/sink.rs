//! Destinations for rendered notifications.
//!
//! Every sink has overwrite-by-key semantics: a repeated key updates the
//! existing entry instead of adding a second one.

use super::render::Notification;
use crate::error::{AlertError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::info;

/// Host notification surface.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Show (or replace) the notification identified by `notification.key`.
    async fn post(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log. Used by the command-line host.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn post(&self, notification: Notification) -> Result<()> {
        info!(
            key = %notification.key,
            title = %notification.title,
            body = %notification.body,
            maps = %notification.maps_url,
            "alert notification"
        );
        Ok(())
    }
}

/// Forwards notifications to a host over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn post(&self, notification: Notification) -> Result<()> {
        self.tx
            .send(notification)
            .map_err(|_| AlertError::Notify("notification channel closed".to_owned()))
    }
}

/// In-memory notification shade keeping one entry per key.
#[derive(Debug, Default)]
pub struct MemorySink {
    shown: Mutex<Vec<Notification>>,
    posts: Mutex<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently visible notifications, in first-posted order.
    pub fn shown(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }

    /// Total `post` calls, including overwrites.
    pub fn post_count(&self) -> usize {
        self.posts.lock().map(|n| *n).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn post(&self, notification: Notification) -> Result<()> {
        let mut shown = self
            .shown
            .lock()
            .map_err(|e| AlertError::Notify(format!("notification shade poisoned: {e}")))?;
        match shown.iter_mut().find(|n| n.key == notification.key) {
            Some(existing) => *existing = notification,
            None => shown.push(notification),
        }
        if let Ok(mut posts) = self.posts.lock() {
            *posts += 1;
        }
        Ok(())
    }
}
