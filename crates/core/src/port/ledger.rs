// Ledger Export Port
// Completed entries are appended to an external ledger (e.g. a spreadsheet).

use crate::domain::QueueEntry;
use async_trait::async_trait;
use thiserror::Error;

/// Ledger export errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger rejected entry: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Ledger sink
///
/// Delivery is at-least-once: implementations must be idempotent on `entry.id`.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    async fn append(&self, entry: &QueueEntry) -> Result<(), LedgerError>;
}

/// Sink that only logs (used when no ledger is configured)
pub struct TracingLedgerSink;

#[async_trait]
impl LedgerSink for TracingLedgerSink {
    async fn append(&self, entry: &QueueEntry) -> Result<(), LedgerError> {
        tracing::info!(
            entry_id = %entry.id,
            name = %entry.name,
            photo_count = entry.photo_count,
            total_price = entry.total_price,
            payment_method = ?entry.payment_method,
            "Completed entry (no ledger configured)"
        );
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every appended entry; optionally fails the first N calls
    #[derive(Clone, Default)]
    pub struct RecordingLedgerSink {
        appended: Arc<Mutex<Vec<QueueEntry>>>,
        failures_left: Arc<Mutex<u32>>,
        call_count: Arc<Mutex<u32>>,
    }

    impl RecordingLedgerSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_first(failures: u32) -> Self {
            let sink = Self::default();
            *sink.failures_left.lock().unwrap() = failures;
            sink
        }

        pub fn appended(&self) -> Vec<QueueEntry> {
            self.appended.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> u32 {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl LedgerSink for RecordingLedgerSink {
        async fn append(&self, entry: &QueueEntry) -> Result<(), LedgerError> {
            *self.call_count.lock().unwrap() += 1;
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(LedgerError::Unavailable("mock outage".to_string()));
                }
            }
            self.appended.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }
}
