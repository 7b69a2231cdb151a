use crate::janitor::Janitor;
use log::info;
use std::time::Duration;
use tokio::{signal, sync::watch};
use tracing::info_span;

/// Lifetime totals of a daemon run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Totals {
    pub cycles: u64,
    pub deleted: usize,
    pub freed_bytes: u64,
}

/// Stop handle for [`run`].
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Runs a scan cycle immediately, then once per `interval`, until `shutdown` flips to `true`
/// or its sender is dropped. A cycle in progress always runs to completion.
pub async fn run(
    mut janitor: Janitor,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Totals {
    let mut totals = Totals::default();

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        totals.cycles += 1;
        let report = {
            let _span = info_span!("sweep", cycle = totals.cycles).entered();
            janitor.sweep()
        };
        totals.deleted += report.deleted;
        totals.freed_bytes += report.freed_bytes;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(
        "Janitor stopped after {} cycle(s), deleted {} file(s), freed {} bytes",
        totals.cycles, totals.deleted, totals.freed_bytes
    );

    totals
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
