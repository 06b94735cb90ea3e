//! Trigger scheduling.
//!
//! Two independently armed paths cause sync attempts: a periodic path that
//! repeats on its own, and an optional exact-time path that needs a platform
//! permission and must be re-armed after every fire.

pub mod coordinator;
pub mod permission;

pub use coordinator::{
    ExactPathState, FireSource, ScheduleState, TriggerConfig, TriggerCoordinator, run_with_retries,
};
pub use permission::{PermissionFlag, PermissionProbe};
