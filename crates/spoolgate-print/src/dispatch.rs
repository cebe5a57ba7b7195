// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hand-off of spooled files to the host's print subsystem.
//
// The only OS-specific code in the service lives here.  A `PrintSink` takes a
// spool file path and either prints it or fails; `CommandSink` does so by
// running the platform's print command and waiting for it to exit:
//
//   Unix     default:  lp <file>
//            named:    lp -d <printer> <file>
//   Windows  default:  print <file>
//            named:    cmd /c copy <file> <printer>

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use spoolgate_core::error::{Result, SpoolgateError};

// ---------------------------------------------------------------------------
// Sink abstraction
// ---------------------------------------------------------------------------

/// Something that can print a spooled file.
#[async_trait]
pub trait PrintSink: Send + Sync {
    /// Print the file at `path`, returning once the attempt has finished.
    async fn print(&self, path: &Path) -> Result<()>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// OS print command
// ---------------------------------------------------------------------------

/// Platform conventions for invoking the native print command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintConvention {
    /// CUPS / System V `lp`.
    Unix,
    /// `print` for the default printer, `copy` to a named printer share.
    Windows,
}

impl PrintConvention {
    /// Convention of the platform this binary was built for.
    pub fn native() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Build the command line that prints `path` on `printer` (or the default).
    pub fn invocation(&self, path: &Path, printer: Option<&str>) -> Invocation {
        let file = path.as_os_str().to_owned();
        match (self, printer) {
            (Self::Unix, None) => Invocation::new("lp", [file]),
            (Self::Unix, Some(name)) => Invocation::new("lp", ["-d".into(), name.into(), file]),
            (Self::Windows, None) => Invocation::new("print", [file]),
            (Self::Windows, Some(name)) => {
                Invocation::new("cmd", ["/c".into(), "copy".into(), file, name.into()])
            }
        }
    }
}

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>, args: impl IntoIterator<Item = OsString>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Run to completion.  Any spawn failure or non-zero exit is a
    /// [`SpoolgateError::Dispatch`] carrying the detail.
    pub async fn run(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                SpoolgateError::Dispatch(format!("{}: {e}", self.program.to_string_lossy()))
            })?;

        if output.status.success() {
            debug!(
                program = %self.program.to_string_lossy(),
                stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                "print command finished"
            );
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let mut detail = format!("{} {}", self.program.to_string_lossy(), output.status);
        if !stderr.is_empty() {
            detail.push_str(": ");
            detail.push_str(stderr);
        }
        Err(SpoolgateError::Dispatch(detail))
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Prints by running the OS print command against the spool file.
#[derive(Debug, Clone)]
pub struct CommandSink {
    convention: PrintConvention,
    printer: Option<String>,
}

impl CommandSink {
    /// Sink for `printer` (`None` = system default) using the native convention.
    pub fn new(printer: Option<&str>) -> Self {
        Self::with_convention(PrintConvention::native(), printer)
    }

    pub fn with_convention(convention: PrintConvention, printer: Option<&str>) -> Self {
        Self {
            convention,
            printer: printer.map(str::to_owned),
        }
    }

    pub fn invocation(&self, path: &Path) -> Invocation {
        self.convention.invocation(path, self.printer.as_deref())
    }
}

#[async_trait]
impl PrintSink for CommandSink {
    async fn print(&self, path: &Path) -> Result<()> {
        let invocation = self.invocation(path);
        debug!(command = %invocation, "running print command");
        invocation.run().await
    }

    fn describe(&self) -> String {
        match &self.printer {
            Some(name) => name.clone(),
            None => "Default Printer".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Sends spooled jobs to a sink and counts dispatch attempts.
///
/// The counter is telemetry only; nothing gates on it.
pub struct Dispatcher {
    sink: Arc<dyn PrintSink>,
    attempts: AtomicU64,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn PrintSink>) -> Self {
        Self {
            sink,
            attempts: AtomicU64::new(0),
        }
    }

    /// Number of dispatch attempts since startup, successful or not.
    pub fn dispatched(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Print the spool file at `path`, blocking this task until the sink is done.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn dispatch(&self, path: &Path) -> Result<()> {
        // Counted before the outcome is known.
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;

        match self.sink.print(path).await {
            Ok(()) => {
                info!(attempt, printer = %self.sink.describe(), "print job sent to printer");
                Ok(())
            }
            Err(e) => {
                warn!(attempt, printer = %self.sink.describe(), error = %e, "print dispatch failed");
                Err(e)
            }
        }
    }
}
