//! HTTP implementation of [`RemoteFeed`](super::RemoteFeed).
//!
//! Issues a plain GET and expects a top-level JSON array. Elements are
//! decoded one at a time so a single malformed alert is skipped instead of
//! failing the whole batch; unknown fields are ignored.

use super::RemoteFeed;
use crate::alert::AlertRecord;
use crate::config::FeedConfig;
use crate::error::{AlertError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Default User-Agent sent with feed requests.
const DEFAULT_USER_AGENT: &str = concat!("alertsync/", env!("CARGO_PKG_VERSION"));

/// Feed backed by a JSON array endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    /// Build a feed from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.url.clone(),
        })
    }

    /// Endpoint this feed polls.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Build a [`reqwest::Client`] with the configured timeout and User-Agent.
///
/// # Errors
///
/// Returns [`AlertError::Config`] if the client cannot be constructed.
pub fn build_client(config: &FeedConfig) -> Result<reqwest::Client> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| AlertError::Config(format!("failed to build HTTP client: {e}")))
}

#[async_trait]
impl RemoteFeed for HttpFeed {
    async fn fetch(&self) -> Result<Vec<AlertRecord>> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AlertError::Fetch(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Fetch(format!(
                "feed returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AlertError::Fetch(format!("cannot read feed body: {e}")))?;

        let alerts = decode_alerts(&body)?;
        debug!(count = alerts.len(), "fetched alert feed");
        Ok(alerts)
    }
}

/// Decode a feed body into alerts, skipping elements that do not decode.
///
/// # Errors
///
/// Returns [`AlertError::Fetch`] if the body is not JSON or not a top-level array.
pub fn decode_alerts(body: &str) -> Result<Vec<AlertRecord>> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AlertError::Fetch(format!("feed is not valid JSON: {e}")))?;

    let serde_json::Value::Array(items) = parsed else {
        return Err(AlertError::Fetch(
            "feed must be a top-level JSON array".to_owned(),
        ));
    };

    let mut alerts = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<AlertRecord>(item) {
            Ok(alert) => alerts.push(alert),
            Err(e) => warn!(index, error = %e, "skipping undecodable feed entry"),
        }
    }
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn decode_skips_bad_entries_and_keeps_order() {
        let body = r#"[
            {"name": "A", "latitude": 1.0, "longitude": 2.0, "endTime": "x"},
            {"name": "Broken"},
            "not an object",
            {"name": "B", "latitude": 3.0, "longitude": 4.0, "extra": {"nested": true}}
        ]"#;
        let alerts = decode_alerts(body).unwrap();
        let names: Vec<&str> = alerts.iter().map(|a| a.display_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn decode_empty_array() {
        assert!(decode_alerts("[]").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_object_body() {
        let err = decode_alerts(r#"{"alerts": []}"#).unwrap_err();
        assert!(matches!(err, AlertError::Fetch(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(decode_alerts("<html>").is_err());
    }

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&FeedConfig::default()).is_ok());
    }

    #[test]
    fn feed_keeps_configured_url() {
        let config = FeedConfig {
            url: "https://alerts.example.com/api/pokemon".into(),
            user_agent: Some("CustomBot/1.0".into()),
            ..Default::default()
        };
        let feed = HttpFeed::new(&config).unwrap();
        assert_eq!(feed.url(), "https://alerts.example.com/api/pokemon");
    }
}
