// Engine constants (no magic values)

use std::time::Duration;

/// Events buffered per subscriber before it lags behind (256)
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// First ledger retry delay (500ms)
pub const DEFAULT_LEDGER_RETRY_BASE_DELAY_MS: i64 = 500;

/// Exponential factor applied per failed ledger attempt
pub const DEFAULT_LEDGER_BACKOFF_FACTOR: f64 = 2.0;

/// Ledger append attempts before an entry is abandoned
pub const DEFAULT_LEDGER_MAX_ATTEMPTS: u32 = 5;

/// Upper bound on a single ledger retry delay (1 minute)
pub const MAX_LEDGER_RETRY_DELAY: Duration = Duration::from_secs(60);
