// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles shared by the unit tests in this crate.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use spoolgate_core::error::{Result, SpoolgateError};

use crate::dispatch::PrintSink;
use crate::retention::RetentionScheduler;

/// What the sink saw at the moment it was asked to print.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: PathBuf,
    pub existed: bool,
    pub contents: Vec<u8>,
}

/// Sink that records every request and optionally fails it.
#[derive(Default)]
pub struct RecordingSink {
    fail_with: Option<String>,
    seen: Mutex<Vec<Seen>>,
}

impl RecordingSink {
    pub fn failing(detail: &str) -> Self {
        Self {
            fail_with: Some(detail.to_owned()),
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PrintSink for RecordingSink {
    async fn print(&self, path: &Path) -> Result<()> {
        self.seen.lock().expect("lock").push(Seen {
            path: path.to_path_buf(),
            existed: path.is_file(),
            contents: std::fs::read(path).unwrap_or_default(),
        });
        match &self.fail_with {
            Some(detail) => Err(SpoolgateError::Dispatch(detail.clone())),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        "recording".into()
    }
}

/// Waits for the reaper's blocking removals to report `count` expiries.
/// Paused test clocks do not auto-advance while blocking work is in flight.
pub async fn wait_for_expired(scheduler: &RetentionScheduler, count: u64) {
    for _ in 0..500 {
        if scheduler.expired() >= count {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    panic!("expected {count} expiries, saw {}", scheduler.expired());
}
