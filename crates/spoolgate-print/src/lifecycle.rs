// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print-job lifecycle: receive -> spool -> schedule reclamation -> dispatch.
//
// A submission moves through `Received -> Spooled -> DispatchAttempted ->
// {Dispatched | DispatchFailed}`.  Independently of that outcome, a spooled
// file is reclaimed by the retention scheduler once the retention window has
// elapsed.  A failed dispatch leaves the file in place until then so the job
// can be inspected or re-sent by hand.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use tracing::{debug, info, instrument, warn};

use spoolgate_core::Config;
use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_core::types::{JobState, PrintJob};

use crate::dispatch::{CommandSink, Dispatcher, PrintSink};
use crate::identity::IdentityGenerator;
use crate::retention::RetentionScheduler;
use crate::spool::{SpoolStore, SweepReport};

/// Fresh identities tried before a spool name collision is reported.
const MAX_IDENTITY_ATTEMPTS: usize = 8;

/// Orchestrates every accepted job.  Shared across request tasks behind an `Arc`.
pub struct LifecycleManager {
    store: SpoolStore,
    identities: IdentityGenerator,
    dispatcher: Dispatcher,
    retention: RetentionScheduler,
    retention_window: Duration,
}

impl LifecycleManager {
    /// Build a manager and start its retention reaper on the current runtime.
    pub fn new(store: SpoolStore, sink: Arc<dyn PrintSink>, retention_window: Duration) -> Self {
        let retention = RetentionScheduler::spawn(store.clone());
        Self {
            store,
            identities: IdentityGenerator::new(),
            dispatcher: Dispatcher::new(sink),
            retention,
            retention_window,
        }
    }

    /// Manager printing through the OS print command, as configured.
    pub fn from_config(config: &Config) -> Self {
        let sink = Arc::new(CommandSink::new(config.printer()));
        Self::new(SpoolStore::new(&config.print_dir), sink, config.retention())
    }

    pub fn store(&self) -> &SpoolStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn retention(&self) -> &RetentionScheduler {
        &self.retention
    }

    /// Remove spool files left behind by a previous run.
    ///
    /// Call once, before the ingress starts accepting requests.
    pub fn recover_orphans(&self) -> Result<SweepReport> {
        self.store.ensure_directory()?;
        Ok(self.store.sweep_stale())
    }

    /// Spool `payload`, schedule its reclamation and print it.
    ///
    /// On success the returned job names the spool file.  Directory, write
    /// and dispatch failures are returned as-is; after a dispatch failure the
    /// spool file stays until the retention window elapses.
    ///
    /// Dropping the returned future never strands a spool file: a write that
    /// completes always has its deletion scheduled.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn handle_submission(&self, payload: Bytes) -> Result<PrintJob> {
        debug!(state = %JobState::Received, "received print job request");

        let job = self.spool(payload).await?;
        info!(
            state = %JobState::Spooled,
            identity = %job.identity,
            path = %job.path.display(),
            hash = %job.document_hash,
            "created print job file"
        );

        debug!(state = %JobState::DispatchAttempted, identity = %job.identity, "dispatching");
        match self.dispatcher.dispatch(&job.path).await {
            Ok(()) => {
                info!(state = %JobState::Dispatched, identity = %job.identity, "print job dispatched");
                Ok(job)
            }
            Err(e) => {
                warn!(
                    state = %JobState::DispatchFailed,
                    identity = %job.identity,
                    path = %job.path.display(),
                    "spool file kept until retention expiry"
                );
                Err(e)
            }
        }
    }

    /// Ensure the directory, write the payload under a fresh identity and
    /// schedule its deletion, retrying on name collisions.
    ///
    /// Write and scheduling happen together on the blocking pool, so they
    /// complete even if the caller stops waiting.
    async fn spool(&self, payload: Bytes) -> Result<PrintJob> {
        let mut last_err = None;

        for _ in 0..MAX_IDENTITY_ATTEMPTS {
            let identity = self.identities.next();
            let store = self.store.clone();
            let retention = self.retention.clone();
            let window = self.retention_window;
            let data = payload.clone();

            let written = tokio::task::spawn_blocking(move || -> Result<PrintJob> {
                store.ensure_directory()?;
                let job = store.write(identity, &data)?;
                retention.schedule(job.path.clone(), window);
                Ok(job)
            })
            .await
            .map_err(|e| SpoolgateError::SpoolWrite {
                path: self.store.spool_path(identity),
                source: std::io::Error::other(format!("spool task failed: {e}")),
            })?;

            match written {
                Err(e) if e.is_name_collision() => {
                    warn!(identity = %identity, "spool name already taken, retrying");
                    last_err = Some(e);
                }
                other => return other,
            }
        }

        Err(last_err.unwrap_or_else(|| SpoolgateError::SpoolWrite {
            path: PathBuf::from(self.store.dir()),
            source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        }))
    }
}
