//! RPC Request/Response Types
//!
//! Every request object carries an optional `token` that the authorizer
//! resolves into an operator identity.

use photoqueue_core::domain::{OperationalStatus, Price, Revision};
use serde::{Deserialize, Serialize};

/// Requests without their own fields (snapshot, reset, stats)
#[derive(Debug, Default, Deserialize)]
pub struct EmptyRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// queue.admit.v1 - Admit a customer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitRequest {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub photo_count: u32,
    #[serde(default)]
    pub token: Option<String>,
}

/// queue.begin_service.v1, queue.cancel.v1
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub id: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// queue.complete.v1 - Finish service and record payment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub id: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// admin.force.v1 - Override an entry's status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceRequest {
    pub id: String,
    pub target: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub removed: usize,
}

/// status.set.v1
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusResponse {
    pub status: OperationalStatus,
    pub revision: Revision,
}

/// location.set.v1 - Either field may be omitted, not both
#[derive(Debug, Deserialize)]
pub struct SetLocationRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub presets: Option<Vec<String>>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLocationResponse {
    pub location: String,
    pub preset_locations: Vec<String>,
    pub revision: Revision,
}

/// pricing.set.v1
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPriceRequest {
    pub unit_price: Price,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPriceResponse {
    pub unit_price: Price,
    pub revision: Revision,
}

