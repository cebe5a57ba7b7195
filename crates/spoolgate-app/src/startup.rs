// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-level glue: logging, the startup banner and shutdown signals.

use tracing_subscriber::EnvFilter;

use spoolgate_core::Config;

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

/// Install the global `fmt` subscriber.  `RUST_LOG` overrides the debug flag.
pub fn init_tracing(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(debug))),
        )
        .init();
}

/// Printer label shown in logs.
pub fn printer_label(config: &Config) -> &str {
    config.printer().unwrap_or("Default Printer")
}

/// Log the effective configuration once at startup.
pub fn log_banner(config: &Config) {
    tracing::debug!("starting server");
    tracing::info!("-------------------------------------------------------------");
    tracing::info!("Runs on HTTPS: {}", config.https);
    tracing::info!("Runs on Port: {}", config.port);
    tracing::info!("Print at {}", printer_label(config));
    tracing::info!("Debug: {}", config.debug);
    tracing::info!("Print Directory: {}", config.print_dir.display());
    tracing::info!("Retention: {}s", config.retention_secs);
    tracing::info!("-------------------------------------------------------------");
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_selects_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
    }

    #[test]
    fn printer_label_falls_back_to_default() {
        let mut config = Config::default();
        assert_eq!(printer_label(&config), "Default Printer");

        config.printer_name = "LabelPrinter".into();
        assert_eq!(printer_label(&config), "LabelPrinter");
    }
}
