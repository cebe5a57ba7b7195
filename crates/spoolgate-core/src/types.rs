// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolgate print front end.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// File-name prefix of every spool file.
pub const SPOOL_FILE_PREFIX: &str = "printjob_";

/// Extension that marks a file as a print-job spool file.
pub const SPOOL_FILE_EXTENSION: &str = "prn";

/// Identity of a submitted job: nanoseconds since the Unix epoch at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobIdentity(pub u64);

impl JobIdentity {
    /// Spool file name for this identity, e.g. `printjob_1718000000123456789.prn`.
    pub fn file_name(&self) -> String {
        format!("{SPOOL_FILE_PREFIX}{}.{SPOOL_FILE_EXTENSION}", self.0)
    }

    /// Submission instant encoded in the identity.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let nanos = i64::try_from(self.0).unwrap_or(i64::MAX);
        Utc.timestamp_nanos(nanos)
    }
}

impl std::fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A job that has been written to the spool directory.
///
/// There is no registry of jobs: this value lives only for the duration of a
/// submission.  The spool file is the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJob {
    pub identity: JobIdentity,
    /// Location of the spool file.
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Payload length in bytes.
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the payload.
    pub document_hash: String,
}

/// In-flow states of a submission.  Never persisted; used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Received,
    Spooled,
    DispatchAttempted,
    Dispatched,
    DispatchFailed,
    /// Retention window elapsed and the spool file was reclaimed.
    Expired,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Spooled => "spooled",
            Self::DispatchAttempted => "dispatch-attempted",
            Self::Dispatched => "dispatched",
            Self::DispatchFailed => "dispatch-failed",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Listener transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMode {
    Http,
    Https,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}
