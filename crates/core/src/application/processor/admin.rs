// Administrative commands: force override, reset, status, location, pricing
//
// Privilege is checked by the caller (authorization collaborator); these
// methods only enforce queue invariants.

use super::CommandProcessor;
use crate::domain::{
    EntryStatus, OperationalStatus, PaymentMethod, Price, QueueEntry, QueueEvent, Revision,
};
use crate::error::{AppError, Result};
use tracing::{debug, info, warn};

/// Resulting location state after an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationState {
    pub location: String,
    pub preset_locations: Vec<String>,
    pub revision: Revision,
}

impl CommandProcessor {
    /// Set an entry's status directly, bypassing adjacency rules.
    ///
    /// Still refuses a second in-service entry and still needs a payment
    /// method when the target is `done`.
    pub async fn force(
        &self,
        id: &str,
        target: EntryStatus,
        payment_method: Option<&str>,
    ) -> Result<QueueEntry> {
        let method = match target {
            EntryStatus::Done => Some(
                PaymentMethod::parse_required(payment_method)
                    .map_err(AppError::from)
                    .inspect_err(|e| {
                        debug!(entry_id = %id, error = %e, kind = e.kind(), "Force rejected")
                    })?,
            ),
            _ => None,
        };

        let outcome = {
            let mut state = self.lock().await;
            let now = self.time_provider.now_millis();
            let outcome = state
                .store
                .force(id, target, method, now)
                .inspect_err(|e| {
                    debug!(entry_id = %id, error = %e, kind = e.kind(), "Force rejected")
                })?;

            let revision = self.commit_queue(&mut state);
            warn!(
                entry_id = %id,
                from = %outcome.previous,
                to = %target,
                revision,
                "Entry status forced"
            );
            outcome
        };

        if outcome.reached_done() {
            self.export(&outcome.entry);
        }
        Ok(outcome.entry)
    }

    /// Drop every entry. Irreversible; the external ledger is untouched.
    ///
    /// Returns how many entries were removed.
    pub async fn reset(&self) -> usize {
        let mut state = self.lock().await;
        let removed = state.store.reset();
        let revision = self.commit_queue(&mut state);
        warn!(removed, revision, "Queue reset");
        removed
    }

    pub async fn set_status(&self, status: OperationalStatus) -> Revision {
        let mut state = self.lock().await;
        let previous = state.status;
        state.status = status;
        let revision = self.commit(&mut state, |revision, state| QueueEvent::StatusUpdate {
            revision,
            status: state.status,
        });
        info!(from = %previous, to = %status, revision, "Operational status changed");
        revision
    }

    /// Change the current location, the preset list, or both, as one delta
    pub async fn set_location(
        &self,
        location: Option<&str>,
        preset_locations: Option<Vec<String>>,
    ) -> Result<LocationState> {
        if location.is_none() && preset_locations.is_none() {
            return Err(AppError::Validation(
                "location or preset locations required".to_string(),
            ));
        }

        let mut state = self.lock().await;
        let mut updated = state.location.clone();
        if let Some(location) = location {
            updated.set_current(location)?;
        }
        if let Some(presets) = preset_locations {
            updated.set_presets(presets);
        }
        state.location = updated;

        let revision = self.commit(&mut state, |revision, state| QueueEvent::LocationUpdate {
            revision,
            location: state.location.current().to_string(),
            preset_locations: state.location.presets().to_vec(),
        });
        info!(location = %state.location.current(), revision, "Location changed");

        Ok(LocationState {
            location: state.location.current().to_string(),
            preset_locations: state.location.presets().to_vec(),
            revision,
        })
    }

    /// Change the price applied to future admissions only
    pub async fn update_unit_price(&self, unit_price: Price) -> Result<Revision> {
        if unit_price == 0 {
            return Err(AppError::Validation(
                "unit price must be greater than 0".to_string(),
            ));
        }

        let mut state = self.lock().await;
        self.pricing.set_unit_price(unit_price);
        let revision = self.commit(&mut state, |revision, _| QueueEvent::PricingUpdate {
            revision,
            unit_price,
        });
        info!(unit_price, revision, "Unit price changed");
        Ok(revision)
    }
}
