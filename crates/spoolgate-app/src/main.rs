// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolgate — network front end for a local print spooler.
//
// Entry point. Loads configuration, initialises logging, clears orphaned spool
// files from a previous run, then serves `/print` until interrupted.

mod startup;

use std::process::ExitCode;
use std::sync::Arc;

use spoolgate_core::Config;
use spoolgate_core::config::DEFAULT_CONFIG_FILE;
use spoolgate_core::error::Result;
use spoolgate_print::LifecycleManager;
use spoolgate_print::server;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            startup::init_tracing(false);
            tracing::error!(error = %e, "error reading config file");
            return ExitCode::FAILURE;
        }
    };

    startup::init_tracing(config.debug);
    startup::log_banner(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "spoolgate stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let manager = Arc::new(LifecycleManager::from_config(&config));

    // Must finish before the listener accepts anything.
    let report = manager.recover_orphans()?;
    tracing::debug!(
        removed = report.removed,
        failed = report.failed,
        "cleanup of print jobs completed"
    );

    let app = server::router(Arc::clone(&manager));
    tracing::debug!("print handler setup completed");

    server::serve(&config, app, startup::shutdown_signal()).await?;

    tracing::info!(dispatched = manager.dispatcher().dispatched(), "shutdown complete");
    Ok(())
}
