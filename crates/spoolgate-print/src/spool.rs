// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spool directory management.
//
// Each accepted job is one file `printjob_<identity>.prn` in the spool
// directory.  The store never overwrites an existing file, and every removal
// path is best-effort: failures are logged, never returned to a caller.
//
// All methods are synchronous.  In an async context, wrap writes in
// `tokio::task::spawn_blocking`.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_core::types::{JobIdentity, PrintJob, SPOOL_FILE_EXTENSION};

/// Outcome of a startup sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Spool files deleted.
    pub removed: usize,
    /// Spool files that could not be deleted.
    pub failed: usize,
}

/// Owner of the on-disk representation of print jobs.
#[derive(Debug, Clone)]
pub struct SpoolStore {
    dir: PathBuf,
}

impl SpoolStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the spool file for `identity` lives at.
    pub fn spool_path(&self, identity: JobIdentity) -> PathBuf {
        self.dir.join(identity.file_name())
    }

    /// Whether `path` names a print-job spool file.
    pub fn is_spool_file(path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SPOOL_FILE_EXTENSION))
    }

    /// Create the spool directory (and parents) if it does not exist.
    ///
    /// Idempotent.  Fails if the path exists but is not a directory, or if
    /// creation is denied.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| SpoolgateError::Directory {
            path: self.dir.clone(),
            source,
        })?;
        debug!("spool directory ready");
        Ok(())
    }

    /// Delete every spool file left in the directory by a previous run.
    ///
    /// Files without the spool extension and subdirectories are left alone.
    /// A file that cannot be deleted is logged and skipped.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn sweep_stale(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("spool directory absent, nothing to sweep");
                return report;
            }
            Err(e) => {
                warn!(error = %e, "failed to list spool directory");
                return report;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file || !Self::is_spool_file(&path) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "deleted leftover spool file");
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete leftover spool file");
                    report.failed += 1;
                }
            }
        }

        info!(removed = report.removed, failed = report.failed, "spool sweep completed");
        report
    }

    /// Write `payload` to a new spool file named after `identity`.
    ///
    /// Refuses to replace an existing file; that case surfaces as a
    /// `SpoolWrite` error whose [`SpoolgateError::is_name_collision`] is true.
    #[instrument(skip(self, payload), fields(identity = %identity, bytes = payload.len()))]
    pub fn write(&self, identity: JobIdentity, payload: &[u8]) -> Result<PrintJob> {
        let path = self.spool_path(identity);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| SpoolgateError::SpoolWrite {
                path: path.clone(),
                source,
            })?;

        if let Err(source) = file.write_all(payload).and_then(|()| file.sync_all()) {
            drop(file);
            // Leave no truncated job behind.
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to remove partial spool file");
            }
            return Err(SpoolgateError::SpoolWrite { path, source });
        }

        let document_hash = hex::encode(Sha256::digest(payload));

        debug!(path = %path.display(), hash = %document_hash, "spool file written");

        Ok(PrintJob {
            identity,
            path,
            created_at: identity.timestamp(),
            size_bytes: payload.len() as u64,
            document_hash,
        })
    }

    /// Remove `path` now.
    ///
    /// Returns whether a file was actually removed.  An already-absent file is
    /// not an error; any other failure is logged and swallowed.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("spool file deleted");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("spool file already gone");
                false
            }
            Err(source) => {
                let err = SpoolgateError::Cleanup {
                    path: path.to_path_buf(),
                    source,
                };
                warn!(error = %err, "spool cleanup failed");
                false
            }
        }
    }
}
