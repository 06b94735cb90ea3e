//! Trigger timing tests on tokio's paused clock.
//!
//! These drive the full coordinator → engine → store → notifier path and
//! check which alerts are delivered at which virtual time.

use alertsync::alert::AlertRecord;
use alertsync::feed::RemoteFeed;
use alertsync::notify::{MemorySink, RenderingNotifier};
use alertsync::scheduler::{ExactPathState, PermissionFlag, TriggerConfig, TriggerCoordinator};
use alertsync::store::{MemorySeenStore, SeenStore};
use alertsync::sync::{Outcome, SyncEngine};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct LiveFeed(Mutex<Vec<AlertRecord>>);

impl LiveFeed {
    fn publish(&self, alert: AlertRecord) {
        self.0.lock().expect("feed lock").push(alert);
    }
}

#[async_trait]
impl RemoteFeed for LiveFeed {
    async fn fetch(&self) -> alertsync::Result<Vec<AlertRecord>> {
        Ok(self.0.lock().expect("feed lock").clone())
    }
}

struct World {
    coordinator: TriggerCoordinator,
    feed: Arc<LiveFeed>,
    sink: Arc<MemorySink>,
    store: Arc<MemorySeenStore>,
    permission: Arc<PermissionFlag>,
}

fn world(granted: bool) -> World {
    let feed = Arc::new(LiveFeed::default());
    let sink = Arc::new(MemorySink::new());
    let store = Arc::new(MemorySeenStore::new());
    let engine = SyncEngine::new(
        feed.clone(),
        store.clone(),
        Arc::new(RenderingNotifier::new(sink.clone())),
    );
    let permission = Arc::new(PermissionFlag::new(granted));
    let coordinator =
        TriggerCoordinator::new(Arc::new(engine), permission.clone(), TriggerConfig::default());
    World {
        coordinator,
        feed,
        sink,
        store,
        permission,
    }
}

async fn advance_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn test_new_alert_is_picked_up_by_exact_path_first() {
    let w = world(true);
    w.feed.publish(AlertRecord::new("Lugia Raid", 0.0, 0.0).with_end_time("11:00"));
    assert_eq!(w.coordinator.start().await.expect("join"), Outcome::Success);
    assert_eq!(w.sink.post_count(), 1);

    advance_secs(100).await;
    w.feed.publish(AlertRecord::new("Mewtwo Raid", 0.0, 0.0).with_end_time("10:00"));

    // Exact path is due at 600s, well before the periodic path at 900s.
    advance_secs(499).await;
    assert_eq!(w.sink.post_count(), 1);
    advance_secs(2).await;
    assert_eq!(w.sink.post_count(), 2);
    assert!(w.store.get().expect("store").contains("Mewtwo Raid|10:00"));

    w.coordinator.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_without_permission_delivery_waits_for_periodic_path() {
    let w = world(false);
    w.coordinator.start().await.expect("join");
    assert!(w.coordinator.should_prompt_for_permission());

    w.feed.publish(AlertRecord::new("Mewtwo Raid", 0.0, 0.0).with_end_time("10:00"));
    advance_secs(899).await;
    assert_eq!(w.sink.post_count(), 0);
    advance_secs(2).await;
    assert_eq!(w.sink.post_count(), 1);

    // Granting later brings the exact path online.
    w.permission.set_granted(true);
    let state = w.coordinator.on_permission_result();
    assert_eq!(state.exact_path, ExactPathState::Armed);
    assert!(!w.coordinator.should_prompt_for_permission());

    w.coordinator.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_repeated_fires_never_duplicate_notifications() {
    let w = world(true);
    w.feed.publish(AlertRecord::new("Mewtwo Raid", 0.0, 0.0).with_end_time("10:00"));
    w.coordinator.start().await.expect("join");

    advance_secs(3600).await;
    assert_eq!(w.sink.post_count(), 1);
    assert_eq!(w.store.get().expect("store").len(), 1);

    w.coordinator.shutdown();
    assert!(!w.coordinator.state().enabled);
}
