use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::domain::models::Snapshot;

pub trait SnapshotSource: Send {
    fn fetch_snapshot(&self) -> Result<Snapshot>;
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}

pub type ChangeCallback = Box<dyn Fn(&Snapshot, &Snapshot) + Send>;

pub struct Poller {
    source: Box<dyn SnapshotSource>,
    store: SnapshotStore,
    interval: Duration,
    on_change: Option<ChangeCallback>,
    failing: bool,
}

impl Poller {
    pub fn new(
        source: Box<dyn SnapshotSource>,
        store: SnapshotStore,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            interval,
            on_change: None,
            failing: false,
        }
    }

    pub fn with_change_callback(mut self, on_change: ChangeCallback) -> Self {
        self.on_change = Some(on_change);
        self
    }

    pub fn poll_once(&mut self) -> Result<()> {
        let snapshot = match self.source.fetch_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                if self.failing {
                    debug!(error = ?err, "beefweb poll still failing");
                } else {
                    warn!(error = ?err, "beefweb poll failed; keeping last known state");
                }
                self.failing = true;
                return Err(err);
            }
        };

        if self.failing {
            info!("beefweb poll recovered");
            self.failing = false;
        }

        let previous = self.store.replace(snapshot);
        if let Some(on_change) = &self.on_change {
            let current = self.store.current();
            on_change(&previous, &current);
        }
        Ok(())
    }

    pub fn spawn(mut self) -> Result<PollerHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("beefweb-poller".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    let _ = self.poll_once();
                    thread::sleep(self.interval);
                }
                debug!("beefweb poller stopped");
            })
            .context("failed to spawn beefweb poller thread")?;

        Ok(PollerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

pub struct PollerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
