// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process configuration, read once from a JSON document at startup.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoolgateError};
use crate::types::TransportMode;

/// Configuration file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 49155;

/// Default spool directory, relative to the working directory.
pub const DEFAULT_PRINT_DIR: &str = "temp-files";

/// Default retention window for spool files (one hour).
pub const DEFAULT_RETENTION_SECS: u64 = 60 * 60;

/// TLS certificate chain used when `https` is enabled.
pub const TLS_CERT_PATH: &str = "./certificates/server.crt";

/// TLS private key used when `https` is enabled.
pub const TLS_KEY_PATH: &str = "./certificates/server.key";

/// Service settings.  Missing keys take their defaults; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serve over TLS using the certificate material at [`TLS_CERT_PATH`] / [`TLS_KEY_PATH`].
    pub https: bool,
    /// Target printer.  Empty means the system default printer.
    pub printer_name: String,
    /// Verbose logging.
    pub debug: bool,
    /// Directory holding spool files.
    pub print_dir: PathBuf,
    /// TCP port for the HTTP listener.
    pub port: u16,
    /// Seconds a spool file is kept before it is reclaimed.
    pub retention_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            https: false,
            printer_name: String::new(),
            debug: false,
            print_dir: PathBuf::from(DEFAULT_PRINT_DIR),
            port: DEFAULT_PORT,
            retention_secs: DEFAULT_RETENTION_SECS,
        }
    }
}

impl Config {
    /// Read and parse the configuration file at `path`.
    ///
    /// A missing or unparseable file is a [`SpoolgateError::Config`]; the
    /// caller is expected to abort startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SpoolgateError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_json(&raw)
            .map_err(|e| SpoolgateError::Config(format!("parse {}: {e}", path.display())))
    }

    /// Parse a configuration document.
    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn transport(&self) -> TransportMode {
        if self.https {
            TransportMode::Https
        } else {
            TransportMode::Http
        }
    }

    /// The configured printer, passed to the print command verbatim, or
    /// `None` for the system default.
    pub fn printer(&self) -> Option<&str> {
        (!self.printer_name.is_empty()).then_some(self.printer_name.as_str())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Address the listener binds to: all interfaces on the configured port.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
