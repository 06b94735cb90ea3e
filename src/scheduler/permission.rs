//! Exact-time scheduling permission.
//!
//! The coordinator only ever reads this boolean and re-queries it at every
//! checkpoint; acquiring the permission is the host's job.

use std::sync::atomic::{AtomicBool, Ordering};

/// Platform query for the exact-time permission. May change at any time.
pub trait PermissionProbe: Send + Sync {
    fn can_schedule_exact(&self) -> bool;
}

/// Permission held in a flag the host flips from its grant/revoke callbacks.
#[derive(Debug, Default)]
pub struct PermissionFlag {
    granted: AtomicBool,
}

impl PermissionFlag {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl PermissionProbe for PermissionFlag {
    fn can_schedule_exact(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}
