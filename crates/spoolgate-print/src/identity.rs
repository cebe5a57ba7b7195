// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job identity generation.
//
// Identities are wall-clock nanoseconds since the Unix epoch.  A coarse or
// virtualised clock can return the same reading twice, so the generator never
// hands out a value less than or equal to the previous one: a repeated tick
// becomes `previous + 1`.  The resulting file names keep the
// `printjob_<nanoseconds>.prn` shape.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use spoolgate_core::types::JobIdentity;

/// Process-wide source of strictly increasing job identities.
#[derive(Debug, Default)]
pub struct IdentityGenerator {
    last: AtomicU64,
}

impl IdentityGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity for a job submitted now.
    pub fn next(&self) -> JobIdentity {
        self.next_from(now_nanos())
    }

    /// Identity for a job submitted at clock reading `nanos`.
    fn next_from(&self, nanos: u64) -> JobIdentity {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = nanos.max(current.saturating_add(1));
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return JobIdentity(candidate),
                Err(observed) => current = observed,
            }
        }
    }
}

fn now_nanos() -> u64 {
    // `timestamp_nanos_opt` is `None` only past the year 2262.
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(u64::MAX)
}
