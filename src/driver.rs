//! Scheduling loop: one pass per interval until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, trace, Level};

use crate::config::DriverConfig;
use crate::sync::{SyncConfig, SyncEngine, SyncError, SyncReport, TracingListener};

/// Run passes until interrupted, or once when `config.once` is set.
///
/// A failed pass is logged and retried at the next interval. A shutdown
/// signal received mid-pass takes effect once that pass returns.
pub async fn run(config: DriverConfig, sync: SyncConfig) -> Result<()> {
    let engine = Arc::new(SyncEngine::new(sync));

    info!(
        source = %config.source.display(),
        replica = %config.replica.display(),
        interval_secs = config.interval.as_secs(),
        dry_run = engine.is_dry_run(),
        "Folder synchronization started"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut stopping = false;

    loop {
        info!("Starting synchronization...");

        let pass = run_pass(engine.clone(), &config);
        tokio::pin!(pass);

        let outcome = tokio::select! {
            outcome = &mut pass => outcome,
            _ = &mut shutdown => {
                info!("Shutdown requested, finishing current pass...");
                stopping = true;
                (&mut pass).await
            }
        };

        match outcome? {
            Ok(report) => log_report(&report),
            Err(e) => error!("Synchronization failed: {}", e),
        }

        if stopping || config.once {
            break;
        }

        info!("Sleeping for {}s...", config.interval.as_secs());
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(config.interval) => {}
        }
    }

    info!("Program terminated.");
    Ok(())
}

/// Run one blocking pass off the async runtime.
///
/// The outer error is a panicked pass; the inner one is the pass's own failure.
async fn run_pass(
    engine: Arc<SyncEngine>,
    config: &DriverConfig,
) -> Result<Result<SyncReport, SyncError>> {
    let source = config.source.clone();
    let replica = config.replica.clone();

    tokio::task::spawn_blocking(move || engine.synchronize(&source, &replica, &mut TracingListener))
        .await
        .context("Synchronization task panicked")
}

fn log_report(report: &SyncReport) {
    let elapsed = report
        .finished_at()
        .map(|finished| (finished - report.started_at()).num_milliseconds())
        .unwrap_or_default();

    if report.is_empty() {
        info!("Synchronization complete, replica already up to date ({} ms)", elapsed);
    } else {
        info!("Synchronization complete: {} ({} ms)", report.summary(), elapsed);
    }

    if tracing::enabled!(Level::TRACE) {
        match report.to_json() {
            Ok(json) => trace!("{}", json),
            Err(e) => trace!("Could not serialize report: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
