// Queue Mirror - observer-side copy of engine state
//
// Join protocol: subscribe first, then fetch a snapshot, then feed every
// delta through `apply`. Deltas at or below the snapshot revision are already
// contained in it; a jump past `revision + 1` means something was missed.

use crate::domain::{QueueEvent, QueueSnapshot, Revision};

/// Result of feeding one delta to the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Delta was the next revision and is now reflected
    Applied,
    /// Delta is already contained in the mirror; discarded
    Stale,
    /// Deltas between `expected` and `received` were missed; re-fetch a snapshot
    Gap { expected: Revision, received: Revision },
}

/// Observer-side state rebuilt from snapshot + deltas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMirror {
    state: QueueSnapshot,
}

impl QueueMirror {
    pub fn from_snapshot(snapshot: QueueSnapshot) -> Self {
        Self { state: snapshot }
    }

    pub fn revision(&self) -> Revision {
        self.state.revision
    }

    pub fn state(&self) -> &QueueSnapshot {
        &self.state
    }

    /// Replace everything with a freshly fetched snapshot.
    ///
    /// An older snapshot than what the mirror already holds is ignored.
    pub fn resync(&mut self, snapshot: QueueSnapshot) {
        if snapshot.revision >= self.state.revision {
            self.state = snapshot;
        }
    }

    pub fn apply(&mut self, event: QueueEvent) -> ApplyOutcome {
        let received = event.revision();
        let expected = self.state.revision + 1;
        if received < expected {
            return ApplyOutcome::Stale;
        }
        if received > expected {
            return ApplyOutcome::Gap { expected, received };
        }

        match event {
            QueueEvent::QueueUpdate {
                entries,
                in_service,
                ..
            } => {
                self.state.entries = entries;
                self.state.in_service = in_service;
            }
            QueueEvent::StatusUpdate { status, .. } => {
                self.state.status = status;
            }
            QueueEvent::LocationUpdate {
                location,
                preset_locations,
                ..
            } => {
                self.state.location = location;
                self.state.preset_locations = preset_locations;
            }
            QueueEvent::PricingUpdate { unit_price, .. } => {
                self.state.unit_price = unit_price;
            }
        }
        self.state.revision = received;
        ApplyOutcome::Applied
    }
}
