// Queue Entry Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Entry ID (UUID v4 in production)
pub type EntryId = String;

/// Price in integer minor currency units
pub type Price = u64;

/// Entry status
///
/// `Done` and `Cancelled` are terminal for normal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryStatus {
    Waiting,
    InService,
    Done,
    Cancelled,
}

impl EntryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Done | EntryStatus::Cancelled)
    }

    /// Waiting or in service: still occupies a slot in the queue view
    pub fn is_active(self) -> bool {
        matches!(self, EntryStatus::Waiting | EntryStatus::InService)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Waiting => write!(f, "waiting"),
            EntryStatus::InService => write!(f, "inService"),
            EntryStatus::Done => write!(f, "done"),
            EntryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for EntryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "waiting" => Ok(EntryStatus::Waiting),
            "inService" | "in_service" => Ok(EntryStatus::InService),
            "done" => Ok(EntryStatus::Done),
            "cancelled" => Ok(EntryStatus::Cancelled),
            other => Err(DomainError::ValidationError(format!(
                "unknown entry status '{}'",
                other
            ))),
        }
    }
}

/// Payment method recorded when an entry completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    #[serde(alias = "qris")]
    Electronic,
}

impl PaymentMethod {
    /// Parse a caller-supplied payment method that must be present
    pub fn parse_required(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Err(DomainError::ValidationError(
                "payment method is required".to_string(),
            )),
            Some(s) => s.parse(),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Electronic => write!(f, "electronic"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "electronic" | "qris" => Ok(PaymentMethod::Electronic),
            other => Err(DomainError::ValidationError(format!(
                "payment method must be cash or electronic, got '{}'",
                other
            ))),
        }
    }
}

/// Fields supplied by the operator when admitting a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub photo_count: u32,
}

impl NewEntry {
    pub fn new(name: impl Into<String>, photo_count: u32) -> Self {
        Self {
            name: name.into(),
            group: None,
            photo_count,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Queue Entry
///
/// `unit_price` and `total_price` are fixed at admission and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: EntryId,
    pub name: String,
    pub group: Option<String>,
    pub photo_count: u32,
    pub unit_price: Price,
    pub total_price: Price,
    pub status: EntryStatus,
    pub payment_method: Option<PaymentMethod>,

    pub created_at: i64, // epoch ms
    pub service_started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl QueueEntry {
    /// Create a new waiting entry
    ///
    /// # Arguments
    ///
    /// * `id` - Unique entry ID (injected, not generated)
    /// * `created_at` - Admission timestamp in epoch ms (injected, not system time)
    /// * `request` - Operator-supplied fields
    /// * `unit_price` - Price per photo at the moment of admission
    pub fn admit(
        id: impl Into<String>,
        created_at: i64,
        request: NewEntry,
        unit_price: Price,
    ) -> Result<Self> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }
        if request.photo_count < 1 {
            return Err(DomainError::ValidationError(
                "photo count must be at least 1".to_string(),
            ));
        }
        let total_price = Price::from(request.photo_count)
            .checked_mul(unit_price)
            .ok_or_else(|| {
                DomainError::ValidationError(format!(
                    "total price overflows for {} photos at {}",
                    request.photo_count, unit_price
                ))
            })?;
        let group = request
            .group
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Ok(Self {
            id: id.into(),
            name,
            group,
            photo_count: request.photo_count,
            unit_price,
            total_price,
            status: EntryStatus::Waiting,
            payment_method: None,
            created_at,
            service_started_at: None,
            finished_at: None,
        })
    }

    /// waiting -> inService
    pub fn begin_service(&mut self, now_millis: i64) -> Result<()> {
        if self.status != EntryStatus::Waiting {
            return Err(self.invalid_transition(EntryStatus::InService));
        }
        self.status = EntryStatus::InService;
        self.service_started_at = Some(now_millis);
        Ok(())
    }

    /// inService -> done
    pub fn complete(&mut self, payment_method: PaymentMethod, now_millis: i64) -> Result<()> {
        if self.status != EntryStatus::InService {
            return Err(self.invalid_transition(EntryStatus::Done));
        }
        self.status = EntryStatus::Done;
        self.payment_method = Some(payment_method);
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// waiting | inService -> cancelled
    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition(EntryStatus::Cancelled));
        }
        self.status = EntryStatus::Cancelled;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Set status directly, ignoring adjacency.
    ///
    /// The caller (QueueStore) is responsible for the single in-service check.
    /// `payment_method` must be `Some` when forcing to `Done`.
    pub fn force(
        &mut self,
        target: EntryStatus,
        payment_method: Option<PaymentMethod>,
        now_millis: i64,
    ) -> Result<()> {
        match target {
            EntryStatus::Done => {
                let method = payment_method.ok_or_else(|| {
                    DomainError::ValidationError(
                        "payment method is required when forcing to done".to_string(),
                    )
                })?;
                if self.service_started_at.is_none() {
                    self.service_started_at = Some(now_millis);
                }
                self.payment_method = Some(method);
                self.finished_at = Some(now_millis);
            }
            EntryStatus::Cancelled => {
                self.payment_method = None;
                self.finished_at = Some(now_millis);
            }
            EntryStatus::InService => {
                self.payment_method = None;
                self.finished_at = None;
                self.service_started_at = Some(now_millis);
            }
            EntryStatus::Waiting => {
                self.payment_method = None;
                self.finished_at = None;
                self.service_started_at = None;
            }
        }
        self.status = target;
        Ok(())
    }

    /// `total_price == photo_count * unit_price`
    pub fn is_price_consistent(&self) -> bool {
        Price::from(self.photo_count).checked_mul(self.unit_price) == Some(self.total_price)
    }

    fn invalid_transition(&self, to: EntryStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
