// Engine Configuration
//
// Typed, validated once at load time. The core never inspects raw config.

use crate::application::constants::{
    DEFAULT_BROADCAST_CAPACITY, DEFAULT_LEDGER_BACKOFF_FACTOR, DEFAULT_LEDGER_MAX_ATTEMPTS,
    DEFAULT_LEDGER_RETRY_BASE_DELAY_MS,
};
use crate::domain::{AdmissionPolicy, OperationalStatus};
use crate::error::{AppError, Result};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub admission: AdmissionPolicy,
    pub initial_status: OperationalStatus,
    pub initial_location: String,
    pub preset_locations: Vec<String>,
    /// Events buffered per subscriber before it lags and must resync
    pub broadcast_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admission: AdmissionPolicy::default(),
            initial_status: OperationalStatus::Open,
            initial_location: String::new(),
            preset_locations: Vec::new(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.broadcast_capacity == 0 {
            return Err(AppError::Config(
                "broadcast capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ledger export retry settings
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub base_delay_ms: i64,
    pub backoff_factor: f64,
    pub max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_LEDGER_RETRY_BASE_DELAY_MS,
            backoff_factor: DEFAULT_LEDGER_BACKOFF_FACTOR,
            max_attempts: DEFAULT_LEDGER_MAX_ATTEMPTS,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms < 0 {
            return Err(AppError::Config(format!(
                "retry base delay must not be negative, got {}",
                self.base_delay_ms
            )));
        }
        if self.backoff_factor.is_nan() || self.backoff_factor < 1.0 {
            return Err(AppError::Config(format!(
                "backoff factor must be >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }
}
