// Operational Status and Admission Policy

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Process-wide operational status of the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    #[default]
    Open,
    Break,
    Closed,
}

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationalStatus::Open => write!(f, "open"),
            OperationalStatus::Break => write!(f, "break"),
            OperationalStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for OperationalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(OperationalStatus::Open),
            "break" => Ok(OperationalStatus::Break),
            "closed" => Ok(OperationalStatus::Closed),
            other => Err(DomainError::ValidationError(format!(
                "status must be open, break or closed, got '{}'",
                other
            ))),
        }
    }
}

/// Which operational statuses accept new entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    pub allow_during_break: bool,
}

impl AdmissionPolicy {
    pub fn admits(&self, status: OperationalStatus) -> bool {
        match status {
            OperationalStatus::Open => true,
            OperationalStatus::Break => self.allow_during_break,
            OperationalStatus::Closed => false,
        }
    }
}
