// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolgate.
//
// Startup failures (`Config`, `Directory`, `Server`) are fatal.  Per-request
// failures (`Directory`, `SpoolWrite`, `Dispatch`) are rendered verbatim to the
// caller.  `Cleanup` is only ever logged.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Spoolgate operations.
#[derive(Debug, Error)]
pub enum SpoolgateError {
    // -- Startup --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),

    // -- Spool directory / files --
    #[error("cannot create spool directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write spool file {}: {source}", path.display())]
    SpoolWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot remove spool file {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -- Dispatch --
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl SpoolgateError {
    /// True when a spool write failed only because the target name is taken.
    pub fn is_name_collision(&self) -> bool {
        matches!(
            self,
            Self::SpoolWrite { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolgateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn collision_is_detected_only_for_already_exists() {
        let taken = SpoolgateError::SpoolWrite {
            path: PathBuf::from("temp-files/printjob_1.prn"),
            source: io::Error::from(io::ErrorKind::AlreadyExists),
        };
        assert!(taken.is_name_collision());

        let denied = SpoolgateError::SpoolWrite {
            path: PathBuf::from("temp-files/printjob_1.prn"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!denied.is_name_collision());
        assert!(!SpoolgateError::Dispatch("exit status: 1".into()).is_name_collision());
    }

    #[test]
    fn display_carries_underlying_detail() {
        let err = SpoolgateError::Dispatch("lp exited with exit status: 1".into());
        assert_eq!(err.to_string(), "dispatch failed: lp exited with exit status: 1");

        let err = SpoolgateError::Directory {
            path: PathBuf::from("spool"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(err.to_string().contains("spool"));
        assert!(err.to_string().contains("permission denied"));
    }
}
