// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolgate Print — the print-job lifecycle.  Spools incoming payloads to
// disk, hands them to the host print command, reclaims spool files after the
// retention window, and exposes the whole thing over HTTP.

pub mod dispatch;
pub mod identity;
pub mod lifecycle;
pub mod retention;
pub mod server;
pub mod spool;

#[cfg(test)]
mod testing;

pub use dispatch::{CommandSink, Dispatcher, PrintSink};
pub use identity::IdentityGenerator;
pub use lifecycle::LifecycleManager;
pub use retention::RetentionScheduler;
pub use spool::{SpoolStore, SweepReport};
