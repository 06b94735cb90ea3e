//! alertsync: deduplicating delivery of time-boxed location alerts.
//!
//! A remote feed is polled for the full list of active alerts. Alerts whose
//! identity has not been delivered before are turned into one notification
//! each, and their identities are committed to a bounded, durable store so
//! restarts and overlapping triggers do not produce duplicates.
//!
//! # Architecture
//!
//! - **alert**: the [`AlertRecord`] model, its identity, and end-time parsing
//! - **store**: the bounded, insertion-ordered [`SeenStore`]
//! - **feed**: the [`RemoteFeed`] boundary and its HTTP implementation
//! - **notify**: notification rendering and dispatch via [`Notifier`]
//! - **sync**: one fetch → diff → notify → commit attempt ([`SyncEngine`])
//! - **scheduler**: the dual-path [`TriggerCoordinator`]
//! - **surface**: refresh hooks for secondary read-only views

pub mod alert;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod feed;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod surface;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_utils;

pub use alert::{AlertIdentity, AlertRecord};
pub use config::AlertConfig;
pub use error::{AlertError, Result};
pub use feed::{HttpFeed, RemoteFeed};
pub use notify::{Notifier, RenderingNotifier};
pub use scheduler::{ExactPathState, FireSource, ScheduleState, TriggerCoordinator};
pub use store::{FileSeenStore, MemorySeenStore, SeenIds, SeenStore};
pub use surface::SurfaceRefresher;
pub use sync::{Outcome, SyncAttempt, SyncEngine};
