//! Dual-path trigger coordinator.
//!
//! The periodic path is registered once on [`TriggerCoordinator::enable`] and
//! repeats until disabled. The exact-time path is single-flight: arming it
//! cancels any pending exact fire, and every finished fire re-arms it while
//! the state is [`ExactPathState::Armed`].
//!
//! Permission is re-queried at every checkpoint (start, resume, grant
//! callback) and after every fire; a revoked permission moves the state to
//! [`ExactPathState::PermissionDenied`] and leaves only the periodic path.

use super::permission::PermissionProbe;
use crate::config::AlertConfig;
use crate::sync::{Outcome, SyncEngine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exact-time path state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExactPathState {
    #[default]
    Unarmed,
    Armed,
    PermissionDenied,
}

/// Snapshot published to observers such as the permission prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub enabled: bool,
    /// Last answer from the permission probe.
    pub exact_permitted: bool,
    pub exact_path: ExactPathState,
}

/// Which path caused a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireSource {
    Periodic,
    Exact,
    Immediate,
}

impl fmt::Display for FireSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic => write!(f, "periodic"),
            Self::Exact => write!(f, "exact"),
            Self::Immediate => write!(f, "immediate"),
        }
    }
}

/// Timing for both paths and the in-fire retry loop.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub periodic_interval: Duration,
    pub exact_interval: Duration,
    /// Floor applied to every exact arm.
    pub exact_min_delay: Duration,
    /// Whether the exact path is wanted at all.
    pub exact_enabled: bool,
    /// Base backoff between attempts in one fire, doubled per retry.
    pub retry_backoff: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::from(&AlertConfig::default())
    }
}

impl From<&AlertConfig> for TriggerConfig {
    fn from(config: &AlertConfig) -> Self {
        Self {
            periodic_interval: Duration::from_secs(config.schedule.periodic_interval_secs),
            exact_interval: Duration::from_secs(config.schedule.exact_interval_secs),
            exact_min_delay: Duration::from_secs(config.schedule.exact_min_delay_secs),
            exact_enabled: config.schedule.exact_enabled,
            retry_backoff: config.sync.retry_backoff(),
        }
    }
}

/// Delay before attempt `attempt + 1`: `base * 2^(attempt - 1)`.
fn backoff_for(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent)
}

/// Run `engine` from attempt 1 until it stops asking for a retry.
///
/// Cancelling `cancel` abandons any pending backoff wait and returns the
/// last outcome without another attempt.
pub async fn run_with_retries(
    engine: &SyncEngine,
    retry_backoff: Duration,
    cancel: &CancellationToken,
) -> Outcome {
    let mut attempt = 1;
    loop {
        let outcome = engine.run(attempt).await;
        if outcome != Outcome::Retry || attempt >= engine.max_retries() {
            return outcome;
        }
        let delay = backoff_for(retry_backoff, attempt);
        debug!(attempt, delay_secs = delay.as_secs(), "waiting before retry");
        tokio::select! {
            _ = cancel.cancelled() => return outcome,
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

#[derive(Default)]
struct Control {
    /// Present while enabled; parent of every pending timer.
    root: Option<CancellationToken>,
    exact_pending: Option<CancellationToken>,
    periodic: Option<JoinHandle<()>>,
}

struct Inner {
    engine: Arc<SyncEngine>,
    permission: Arc<dyn PermissionProbe>,
    config: TriggerConfig,
    state: watch::Sender<ScheduleState>,
    control: Mutex<Control>,
}

/// Owns both trigger paths. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TriggerCoordinator {
    inner: Arc<Inner>,
}

impl TriggerCoordinator {
    pub fn new(
        engine: Arc<SyncEngine>,
        permission: Arc<dyn PermissionProbe>,
        config: TriggerConfig,
    ) -> Self {
        let (state, _) = watch::channel(ScheduleState::default());
        Self {
            inner: Arc::new(Inner {
                engine,
                permission,
                config,
                state,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.inner
            .control
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Process start: enable, run the first checkpoint, then fire once now.
    pub fn start(&self) -> JoinHandle<Outcome> {
        self.enable();
        self.checkpoint();
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.fire(FireSource::Immediate).await })
    }

    /// Register the periodic path. No-op when already enabled.
    pub fn enable(&self) {
        let mut control = self.control();
        if control.root.is_some() {
            return;
        }
        let root = CancellationToken::new();
        let coordinator = self.clone();
        let cancel = root.clone();
        control.periodic = Some(tokio::spawn(async move {
            coordinator.periodic_loop(cancel).await;
        }));
        control.root = Some(root);
        self.inner.state.send_modify(|s| s.enabled = true);
        info!(
            periodic_secs = self.inner.config.periodic_interval.as_secs(),
            "trigger coordinator enabled"
        );
    }

    /// Tear down both paths. No `run()` starts afterwards until re-enabled.
    pub fn disable(&self) {
        let mut control = self.control();
        let Some(root) = control.root.take() else {
            return;
        };
        root.cancel();
        control.exact_pending = None;
        if let Some(periodic) = control.periodic.take() {
            periodic.abort();
        }
        self.inner.state.send_modify(|s| {
            s.enabled = false;
            s.exact_path = ExactPathState::Unarmed;
        });
        info!("trigger coordinator disabled");
    }

    pub fn shutdown(&self) {
        self.disable();
    }

    /// Re-query the permission and arm or disarm the exact path.
    pub fn checkpoint(&self) -> ScheduleState {
        let permitted = self.inner.permission.can_schedule_exact();
        let mut control = self.control();
        self.inner.state.send_modify(|s| s.exact_permitted = permitted);
        if control.root.is_none() || !self.inner.config.exact_enabled {
            return self.state();
        }

        let current = self.state().exact_path;
        if permitted {
            if current != ExactPathState::Armed {
                self.arm_exact(&mut control, self.inner.config.exact_interval);
                self.set_exact_path(ExactPathState::Armed);
            }
        } else if current != ExactPathState::PermissionDenied {
            Self::cancel_exact(&mut control);
            self.set_exact_path(ExactPathState::PermissionDenied);
            info!("exact-time permission unavailable, relying on periodic path");
        }
        self.state()
    }

    /// App returned to the foreground.
    pub fn on_resume(&self) -> ScheduleState {
        self.checkpoint()
    }

    /// The host's permission flow finished, whatever the answer.
    pub fn on_permission_result(&self) -> ScheduleState {
        self.checkpoint()
    }

    /// One immediate fire with the usual retry loop.
    ///
    /// Returns [`Outcome::Fail`] without running when disabled.
    pub async fn sync_now(&self) -> Outcome {
        self.fire(FireSource::Immediate).await
    }

    pub fn subscribe(&self) -> watch::Receiver<ScheduleState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ScheduleState {
        *self.inner.state.borrow()
    }

    /// True when the exact path is wanted but the permission is missing.
    pub fn should_prompt_for_permission(&self) -> bool {
        let state = self.state();
        state.enabled
            && self.inner.config.exact_enabled
            && state.exact_path == ExactPathState::PermissionDenied
    }

    pub fn has_pending_exact(&self) -> bool {
        self.control()
            .exact_pending
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    fn set_exact_path(&self, exact_path: ExactPathState) {
        self.inner.state.send_modify(|s| s.exact_path = exact_path);
    }

    fn cancel_exact(control: &mut Control) {
        if let Some(pending) = control.exact_pending.take() {
            pending.cancel();
        }
    }

    /// Schedule the next exact fire, superseding any pending one.
    fn arm_exact(&self, control: &mut Control, delay: Duration) {
        let Some(root) = control.root.clone() else {
            return;
        };
        let delay = delay.max(self.inner.config.exact_min_delay);
        Self::cancel_exact(control);

        let token = root.child_token();
        control.exact_pending = Some(token.clone());
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    coordinator.fire(FireSource::Exact).await;
                }
            }
        });
        debug!(delay_secs = delay.as_secs(), "exact-time fire armed");
    }

    async fn fire(&self, source: FireSource) -> Outcome {
        let root = self.control().root.clone();
        let Some(cancel) = root else {
            debug!(%source, "fire skipped, coordinator disabled");
            return Outcome::Fail;
        };
        info!(%source, "sync fire");
        let outcome =
            run_with_retries(&self.inner.engine, self.inner.config.retry_backoff, &cancel).await;
        if outcome == Outcome::Fail {
            warn!(%source, "sync fire failed, next scheduled fire will try again");
        }
        self.on_finished();
        outcome
    }

    /// Re-arm the exact path after a fire, or drop it if permission was lost.
    fn on_finished(&self) {
        let permitted = self.inner.permission.can_schedule_exact();
        let mut control = self.control();
        self.inner.state.send_modify(|s| s.exact_permitted = permitted);
        if control.root.is_none() || self.state().exact_path != ExactPathState::Armed {
            return;
        }
        if permitted {
            self.arm_exact(&mut control, self.inner.config.exact_interval);
        } else {
            Self::cancel_exact(&mut control);
            self.set_exact_path(ExactPathState::PermissionDenied);
            info!("exact-time permission revoked");
        }
    }

    async fn periodic_loop(&self, cancel: CancellationToken) {
        let period = self.inner.config.periodic_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.fire(FireSource::Periodic).await;
                }
            }
        }
    }
}
