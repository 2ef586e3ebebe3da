// Command Processor - the single serialized entry point for every mutation
//
// All writes take one async mutex, so "check invariant then mutate" is never
// interleaved. Each commit bumps the revision, publishes a fresh snapshot and
// broadcasts exactly one delta while still holding the lock, which makes the
// broadcast order equal to the commit order. Reads never take the lock: they
// borrow the last committed snapshot.

mod admin;
#[cfg(test)]
mod processor_test;

pub use admin::LocationState;

use crate::application::broadcaster::{ChangeBroadcaster, Subscription};
use crate::application::ledger::LedgerHandle;
use crate::application::stats::QueueStats;
use crate::application::store::QueueStore;
use crate::config::EngineConfig;
use crate::domain::{
    AdmissionPolicy, LocationRegistry, NewEntry, OperationalStatus, PaymentMethod, Price,
    QueueEntry, QueueEvent, QueueSnapshot, Revision,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, PricingProvider, TimeProvider};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info};

/// Everything guarded by the write lock
struct EngineState {
    store: QueueStore,
    status: OperationalStatus,
    location: LocationRegistry,
    revision: Revision,
}

/// Command Processor
pub struct CommandProcessor {
    state: Mutex<EngineState>,
    snapshot_tx: watch::Sender<Arc<QueueSnapshot>>,
    broadcaster: Arc<ChangeBroadcaster>,
    pricing: Arc<dyn PricingProvider>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    admission: AdmissionPolicy,
    ledger: Option<LedgerHandle>,
}

impl CommandProcessor {
    /// Validates `config`, then builds the broadcaster with its capacity
    pub fn new(
        config: &EngineConfig,
        pricing: Arc<dyn PricingProvider>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let broadcaster = Arc::new(ChangeBroadcaster::new(config.broadcast_capacity));

        let state = EngineState {
            store: QueueStore::new(),
            status: config.initial_status,
            location: LocationRegistry::new(
                config.initial_location.clone(),
                config.preset_locations.clone(),
            ),
            revision: 0,
        };
        let initial = Arc::new(build_snapshot(&state, pricing.current_unit_price()));
        let (snapshot_tx, _) = watch::channel(initial);

        Ok(Self {
            state: Mutex::new(state),
            snapshot_tx,
            broadcaster,
            pricing,
            id_provider,
            time_provider,
            admission: config.admission,
            ledger: None,
        })
    }

    /// Hand completed entries to a ledger exporter
    pub fn with_ledger(mut self, ledger: LedgerHandle) -> Self {
        self.ledger = Some(ledger);
        self
    }

    // ------------------------------------------------------------------
    // Queries: served from the last committed snapshot
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> Arc<QueueSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn revision(&self) -> Revision {
        self.snapshot_tx.borrow().revision
    }

    pub fn list_entries(&self) -> Vec<QueueEntry> {
        self.snapshot().entries.clone()
    }

    pub fn in_service(&self) -> Option<QueueEntry> {
        self.snapshot().in_service.clone()
    }

    pub fn get_entry(&self, id: &str) -> Result<QueueEntry> {
        self.snapshot()
            .entry(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("entry {} not found", id)))
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats::from_entries(&self.snapshot().entries)
    }

    /// Join the broadcast topic; fetch `snapshot()` afterwards to align
    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe()
    }

    pub fn broadcaster(&self) -> &Arc<ChangeBroadcaster> {
        &self.broadcaster
    }

    // ------------------------------------------------------------------
    // Queue commands
    // ------------------------------------------------------------------

    /// Create a waiting entry at the FIFO tail, priced at the current unit price
    pub async fn admit(&self, request: NewEntry) -> Result<QueueEntry> {
        let mut state = self.lock().await;

        if !self.admission.admits(state.status) {
            debug!(status = %state.status, "Admission rejected");
            return Err(AppError::AdmissionClosed(state.status));
        }

        let unit_price = self.pricing.current_unit_price();
        let entry = QueueEntry::admit(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            request,
            unit_price,
        )
        .map_err(AppError::from)
        .inspect_err(|e| {
            debug!(error = %e, kind = e.kind(), "Admission rejected")
        })?;
        state.store.insert(entry.clone())?;

        let revision = self.commit_queue(&mut state);
        info!(
            entry_id = %entry.id,
            photo_count = entry.photo_count,
            total_price = entry.total_price,
            revision,
            "Entry admitted"
        );
        Ok(entry)
    }

    /// waiting -> inService
    pub async fn begin_service(&self, id: &str) -> Result<QueueEntry> {
        let mut state = self.lock().await;
        let now = self.time_provider.now_millis();
        let entry = state
            .store
            .begin_service(id, now)
            .inspect_err(|e| {
                debug!(entry_id = %id, error = %e, kind = e.kind(), "Begin service rejected")
            })?;

        let revision = self.commit_queue(&mut state);
        info!(entry_id = %id, revision, "Entry in service");
        Ok(entry)
    }

    /// inService -> done, recording how the customer paid
    pub async fn complete(&self, id: &str, payment_method: Option<&str>) -> Result<QueueEntry> {
        let method = PaymentMethod::parse_required(payment_method)
            .map_err(AppError::from)
            .inspect_err(|e| {
                debug!(entry_id = %id, error = %e, kind = e.kind(), "Complete rejected")
            })?;

        let entry = {
            let mut state = self.lock().await;
            let now = self.time_provider.now_millis();
            let entry = state
                .store
                .complete(id, method, now)
                .inspect_err(|e| {
                    debug!(entry_id = %id, error = %e, kind = e.kind(), "Complete rejected")
                })?;

            let revision = self.commit_queue(&mut state);
            info!(
                entry_id = %id,
                payment_method = %method,
                total_price = entry.total_price,
                revision,
                "Entry done"
            );
            entry
        };

        self.export(&entry);
        Ok(entry)
    }

    /// waiting | inService -> cancelled
    pub async fn cancel(&self, id: &str) -> Result<QueueEntry> {
        let mut state = self.lock().await;
        let now = self.time_provider.now_millis();
        let entry = state
            .store
            .cancel(id, now)
            .inspect_err(|e| {
                debug!(entry_id = %id, error = %e, kind = e.kind(), "Cancel rejected")
            })?;

        let revision = self.commit_queue(&mut state);
        info!(entry_id = %id, revision, "Entry cancelled");
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Commit machinery (caller holds the lock)
    // ------------------------------------------------------------------

    async fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().await
    }

    fn commit_queue(&self, state: &mut EngineState) -> Revision {
        self.commit(state, |revision, state| QueueEvent::QueueUpdate {
            revision,
            entries: state.store.entries().to_vec(),
            in_service: state.store.in_service().cloned(),
        })
    }

    fn commit(
        &self,
        state: &mut EngineState,
        event: impl FnOnce(Revision, &EngineState) -> QueueEvent,
    ) -> Revision {
        debug_assert_eq!(state.store.check_invariants(), Ok(()));

        state.revision += 1;
        let snapshot = build_snapshot(state, self.pricing.current_unit_price());
        self.snapshot_tx.send_replace(Arc::new(snapshot));
        self.broadcaster.publish(event(state.revision, state));
        state.revision
    }

    /// Runs after the lock is released
    fn export(&self, entry: &QueueEntry) {
        if let Some(ledger) = &self.ledger {
            ledger.submit(entry.clone());
        }
    }
}

fn build_snapshot(state: &EngineState, unit_price: Price) -> QueueSnapshot {
    QueueSnapshot {
        revision: state.revision,
        entries: state.store.entries().to_vec(),
        in_service: state.store.in_service().cloned(),
        status: state.status,
        location: state.location.current().to_string(),
        preset_locations: state.location.presets().to_vec(),
        unit_price,
    }
}
