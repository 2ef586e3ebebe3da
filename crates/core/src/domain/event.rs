// Broadcast Payloads and Snapshot

use crate::domain::entry::{Price, QueueEntry};
use crate::domain::status::OperationalStatus;
use serde::{Deserialize, Serialize};

/// Position in the engine's mutation history.
///
/// Every committed mutation (queue, status, location, pricing) bumps it by one.
pub type Revision = u64;

/// Full state delivered to a joining observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub revision: Revision,
    pub entries: Vec<QueueEntry>,
    pub in_service: Option<QueueEntry>,
    pub status: OperationalStatus,
    pub location: String,
    pub preset_locations: Vec<String>,
    pub unit_price: Price,
}

impl QueueSnapshot {
    /// Snapshot of an engine that has never been mutated
    pub fn initial(
        status: OperationalStatus,
        location: impl Into<String>,
        preset_locations: Vec<String>,
        unit_price: Price,
    ) -> Self {
        Self {
            revision: 0,
            entries: Vec::new(),
            in_service: None,
            status,
            location: location.into(),
            preset_locations,
            unit_price,
        }
    }

    /// Waiting and in-service entries in admission order, with 1-based positions
    pub fn active_queue(&self) -> impl Iterator<Item = (usize, &QueueEntry)> {
        self.entries
            .iter()
            .filter(|e| e.status.is_active())
            .enumerate()
            .map(|(i, e)| (i + 1, e))
    }

    pub fn entry(&self, id: &str) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Delta pushed to every subscriber after a committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum QueueEvent {
    #[serde(rename_all = "camelCase")]
    QueueUpdate {
        revision: Revision,
        entries: Vec<QueueEntry>,
        in_service: Option<QueueEntry>,
    },
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        revision: Revision,
        status: OperationalStatus,
    },
    #[serde(rename_all = "camelCase")]
    LocationUpdate {
        revision: Revision,
        location: String,
        preset_locations: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    PricingUpdate { revision: Revision, unit_price: Price },
}

impl QueueEvent {
    pub fn revision(&self) -> Revision {
        match self {
            QueueEvent::QueueUpdate { revision, .. }
            | QueueEvent::StatusUpdate { revision, .. }
            | QueueEvent::LocationUpdate { revision, .. }
            | QueueEvent::PricingUpdate { revision, .. } => *revision,
        }
    }

    /// Topic name, used in logs
    pub fn topic(&self) -> &'static str {
        match self {
            QueueEvent::QueueUpdate { .. } => "queue-update",
            QueueEvent::StatusUpdate { .. } => "status-update",
            QueueEvent::LocationUpdate { .. } => "location-update",
            QueueEvent::PricingUpdate { .. } => "pricing-update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = QueueEvent::StatusUpdate {
            revision: 7,
            status: OperationalStatus::Break,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status-update");
        assert_eq!(json["data"]["revision"], 7);
        assert_eq!(json["data"]["status"], "break");

        let back: QueueEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_queue_update_uses_camel_case() {
        let event = QueueEvent::QueueUpdate {
            revision: 1,
            entries: vec![],
            in_service: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["data"].get("inService").is_some());
    }
}
