//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC results from the api-rpc crate. Entries, snapshots,
//! events and stats come straight from photoqueue-core.

use photoqueue_core::domain::{Price, Revision};
use serde::Deserialize;

pub use photoqueue_core::application::QueueStats;
pub use photoqueue_core::domain::{
    EntryStatus, NewEntry, OperationalStatus, PaymentMethod, QueueEntry, QueueEvent,
    QueueSnapshot,
};

/// Response from admin.reset.v1
#[derive(Debug, Clone, Deserialize)]
pub struct ResetResponse {
    pub removed: usize,
}

/// Response from status.set.v1
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusChange {
    pub status: OperationalStatus,
    pub revision: Revision,
}

/// Response from location.set.v1
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationChange {
    pub location: String,
    pub preset_locations: Vec<String>,
    pub revision: Revision,
}

/// Response from pricing.set.v1
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub unit_price: Price,
    pub revision: Revision,
}
