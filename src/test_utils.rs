//! Fakes shared by unit tests across modules.

use crate::alert::AlertRecord;
use crate::error::{AlertError, Result};
use crate::feed::RemoteFeed;
use crate::store::{MemorySeenStore, SeenIds, SeenStore};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Feed returning a replaceable fixed list.
#[derive(Debug, Default)]
pub struct StaticFeed {
    alerts: Mutex<Vec<AlertRecord>>,
}

impl StaticFeed {
    pub fn new(alerts: Vec<AlertRecord>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
        }
    }

    pub fn set(&self, alerts: Vec<AlertRecord>) {
        *self.alerts.lock().expect("feed lock") = alerts;
    }
}

#[async_trait]
impl RemoteFeed for StaticFeed {
    async fn fetch(&self) -> Result<Vec<AlertRecord>> {
        Ok(self.alerts.lock().expect("feed lock").clone())
    }
}

/// Feed that always fails with a transient error.
#[derive(Debug, Default)]
pub struct FailingFeed;

#[async_trait]
impl RemoteFeed for FailingFeed {
    async fn fetch(&self) -> Result<Vec<AlertRecord>> {
        Err(AlertError::Fetch("connection refused".into()))
    }
}

/// Feed that counts calls and either succeeds with a list or always fails.
#[derive(Debug)]
pub struct CountingFeed {
    calls: AtomicUsize,
    alerts: Option<Vec<AlertRecord>>,
}

impl CountingFeed {
    pub fn ok(alerts: Vec<AlertRecord>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            alerts: Some(alerts),
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            alerts: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteFeed for CountingFeed {
    async fn fetch(&self) -> Result<Vec<AlertRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.alerts {
            Some(alerts) => Ok(alerts.clone()),
            None => Err(AlertError::Fetch("timed out".into())),
        }
    }
}

/// Store whose writes (and optionally reads) fail.
#[derive(Debug, Default)]
pub struct FailingStore {
    fail_reads: bool,
    inner: MemorySeenStore,
}

impl FailingStore {
    pub fn always() -> Self {
        Self {
            fail_reads: true,
            inner: MemorySeenStore::new(),
        }
    }

    pub fn write_only_fails() -> Self {
        Self {
            fail_reads: false,
            inner: MemorySeenStore::new(),
        }
    }
}

impl SeenStore for FailingStore {
    fn get(&self) -> Result<SeenIds> {
        if self.fail_reads {
            return Err(AlertError::Persistence("disk unavailable".into()));
        }
        self.inner.get()
    }

    fn update(&self, _ids: SeenIds) -> Result<()> {
        Err(AlertError::Persistence("disk full".into()))
    }

    fn commit(&self, _new_ids: &[String]) -> Result<SeenIds> {
        Err(AlertError::Persistence("disk full".into()))
    }
}
