//! Remote alert feed.
//!
//! [`RemoteFeed`] is the only network boundary: it returns the full list of
//! currently active alerts or fails. Calls are read-only.

pub mod http;

pub use http::{HttpFeed, decode_alerts};

use crate::alert::AlertRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Source of the current alert list.
#[async_trait]
pub trait RemoteFeed: Send + Sync {
    /// Fetch every active alert, in feed order.
    async fn fetch(&self) -> Result<Vec<AlertRecord>>;
}
