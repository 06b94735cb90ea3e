//! Alert data model.
//!
//! An [`AlertRecord`] is an immutable value decoded from the remote feed.
//! Its [`AlertIdentity`] (`trim(name)|trim(endTime)`) is the only key used
//! for deduplication and for notification and summary-row identity.

pub mod record;
pub mod time;

pub use record::{AlertIdentity, AlertRecord};
pub use time::{format_remaining, parse_end_time};
