// Ledger Exporter - fire-and-forget delivery of completed entries
//
// Runs outside the command critical section. A failed export is retried and
// eventually abandoned; it never rolls back the queue.

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::QueueEntry;
use crate::port::LedgerSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Cheap handle the CommandProcessor uses to hand off completed entries
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::UnboundedSender<QueueEntry>,
}

impl LedgerHandle {
    /// Queue an entry for export; never blocks
    pub fn submit(&self, entry: QueueEntry) {
        let entry_id = entry.id.clone();
        if self.tx.send(entry).is_err() {
            error!(entry_id = %entry_id, "Ledger exporter stopped; completed entry not exported");
        }
    }
}

/// Background task draining the export channel into a `LedgerSink`
pub struct LedgerExporter {
    sink: Arc<dyn LedgerSink>,
    retry_policy: RetryPolicy,
    rx: mpsc::UnboundedReceiver<QueueEntry>,
}

/// Create a connected handle/exporter pair
pub fn ledger_channel(
    sink: Arc<dyn LedgerSink>,
    retry_policy: RetryPolicy,
) -> (LedgerHandle, LedgerExporter) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        LedgerHandle { tx },
        LedgerExporter {
            sink,
            retry_policy,
            rx,
        },
    )
}

impl LedgerExporter {
    /// Run until shutdown or until every handle is dropped.
    ///
    /// Entries still queued at shutdown get one final attempt each.
    pub async fn run(mut self, mut shutdown: ShutdownToken) {
        info!(
            max_attempts = self.retry_policy.max_attempts(),
            "Ledger exporter started"
        );
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(entry) => self.export(&entry, &mut shutdown).await,
                    None => break,
                },
                _ = shutdown.wait() => break,
            }
        }

        self.rx.close();
        while let Ok(entry) = self.rx.try_recv() {
            self.export(&entry, &mut shutdown).await;
        }
        info!("Ledger exporter stopped");
    }

    async fn export(&self, entry: &QueueEntry, shutdown: &mut ShutdownToken) {
        let mut failures: u32 = 0;
        loop {
            let err = match self.sink.append(entry).await {
                Ok(()) => {
                    info!(entry_id = %entry.id, attempts = failures + 1, "Entry exported to ledger");
                    return;
                }
                Err(e) => e,
            };
            failures += 1;

            if shutdown.is_shutdown() {
                error!(entry_id = %entry.id, error = %err, "Ledger export abandoned at shutdown");
                return;
            }

            match self.retry_policy.should_retry(&entry.id, failures) {
                RetryDecision::Retry(delay_ms) => {
                    warn!(
                        entry_id = %entry.id,
                        attempt = failures,
                        delay_ms,
                        error = %err,
                        "Ledger export failed, retrying"
                    );
                    tokio::select! {
                        _ = sleep(Duration::from_millis(delay_ms.max(0) as u64)) => {}
                        // Fall through to one last attempt
                        _ = shutdown.wait() => {}
                    }
                }
                RetryDecision::GiveUp => {
                    error!(
                        entry_id = %entry.id,
                        attempts = failures,
                        error = %err,
                        "Ledger export abandoned"
                    );
                    return;
                }
            }
        }
    }
}
