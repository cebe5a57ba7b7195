// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deferred reclamation of spool files.
//
// A single reaper task owns a `DelayQueue` keyed by spool path.  Request
// handlers push `(path, delay)` over a channel and move on; the reaper deletes
// each file once its delay has elapsed.  Entries cannot be cancelled.  If the
// file is already gone when the entry expires, the deletion is a no-op.
// Removals run on the blocking pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;
use tracing::{debug, info, warn};

use spoolgate_core::types::JobState;

use crate::spool::SpoolStore;

/// A request to delete `path` once `after` has elapsed.
#[derive(Debug)]
struct Expiry {
    path: PathBuf,
    after: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    scheduled: AtomicU64,
    expired: AtomicU64,
}

/// Handle for scheduling spool file deletions.
///
/// Cheap to clone.  The reaper task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct RetentionScheduler {
    tx: mpsc::UnboundedSender<Expiry>,
    counters: Arc<Counters>,
}

impl RetentionScheduler {
    /// Start the reaper on the current Tokio runtime.
    pub fn spawn(store: SpoolStore) -> Self {
        let (scheduler, _task) = Self::spawn_with_handle(store);
        scheduler
    }

    /// Like [`spawn`](Self::spawn), also returning the reaper's task handle.
    pub fn spawn_with_handle(store: SpoolStore) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let task = tokio::spawn(reap(store, rx, Arc::clone(&counters)));
        (Self { tx, counters }, task)
    }

    /// Delete `path` once `after` has elapsed.  Fire-and-forget.
    pub fn schedule(&self, path: PathBuf, after: Duration) {
        debug!(path = %path.display(), after_secs = after.as_secs(), "spool deletion scheduled");
        match self.tx.send(Expiry { path, after }) {
            Ok(()) => {
                self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::SendError(expiry)) => {
                warn!(path = %expiry.path.display(), "retention reaper stopped, deletion not scheduled");
            }
        }
    }

    /// Deletions accepted since startup.
    pub fn scheduled(&self) -> u64 {
        self.counters.scheduled.load(Ordering::Relaxed)
    }

    /// Deletions whose delay has elapsed and that have been carried out
    /// (including ones that found the file already gone).
    pub fn expired(&self) -> u64 {
        self.counters.expired.load(Ordering::Relaxed)
    }
}

async fn reap(store: SpoolStore, mut rx: mpsc::UnboundedReceiver<Expiry>, counters: Arc<Counters>) {
    let mut queue: DelayQueue<PathBuf> = DelayQueue::new();

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(Expiry { path, after }) => {
                    queue.insert(path, after);
                }
                None => break,
            },

            Some(expired) = std::future::poll_fn(|cx| queue.poll_expired(cx)), if !queue.is_empty() => {
                let path = expired.into_inner();
                let store = store.clone();
                let counters = Arc::clone(&counters);
                tokio::task::spawn_blocking(move || {
                    if store.delete(&path) {
                        info!(state = %JobState::Expired, path = %path.display(), "print job file deleted");
                    } else {
                        debug!(state = %JobState::Expired, path = %path.display(), "nothing left to delete");
                    }
                    counters.expired.fetch_add(1, Ordering::Relaxed);
                });
            }
        }
    }

    debug!(pending = queue.len(), "retention reaper stopped");
}
