// Retry logic for ledger export
use crate::application::constants::MAX_LEDGER_RETRY_DELAY;
use crate::config::RetrySettings;
use tracing::warn;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the export (with backoff delay in ms)
    Retry(i64),
    /// Do not retry, the export is abandoned
    GiveUp,
}

/// Exponential backoff with deterministic per-entry jitter
///
/// delay = base_delay * (backoff_factor ^ attempt) * (0.9 .. 1.1)
pub struct RetryPolicy {
    settings: RetrySettings,
}

impl RetryPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    pub fn max_attempts(&self) -> u32 {
        self.settings.max_attempts
    }

    /// Decide what happens after `attempts` failed appends of `entry_id`
    pub fn should_retry(&self, entry_id: &str, attempts: u32) -> RetryDecision {
        if attempts >= self.settings.max_attempts {
            warn!(
                entry_id = %entry_id,
                attempts,
                max_attempts = self.settings.max_attempts,
                "Max ledger attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_delay_ms = self.settings.base_delay_ms as f64
            * self.settings.backoff_factor.powi(exponent);

        // Jitter seeded by id so concurrent retries spread out but stay reproducible
        let jitter_seed = entry_id.chars().map(|c| c as u32).fold(0u32, u32::wrapping_add);
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let cap_ms = MAX_LEDGER_RETRY_DELAY.as_millis() as f64;
        let delay_ms = (base_delay_ms * jitter_factor).min(cap_ms) as i64;

        RetryDecision::Retry(delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(RetrySettings {
            base_delay_ms: 1000,
            backoff_factor: 2.0,
            max_attempts,
        })
    }

    fn delay(decision: RetryDecision) -> i64 {
        match decision {
            RetryDecision::Retry(ms) => ms,
            RetryDecision::GiveUp => panic!("expected retry"),
        }
    }

    #[test]
    fn test_exponential_backoff_with_jitter() {
        let policy = policy(5);

        let first = delay(policy.should_retry("entry-1", 1));
        let second = delay(policy.should_retry("entry-1", 2));
        let third = delay(policy.should_retry("entry-1", 3));

        assert!((900..=1100).contains(&first), "first delay {}", first);
        assert!((1800..=2200).contains(&second), "second delay {}", second);
        assert!((3600..=4400).contains(&third), "third delay {}", third);
    }

    #[test]
    fn test_jitter_is_deterministic_per_id() {
        let policy = policy(5);
        assert_eq!(
            policy.should_retry("entry-42", 2),
            policy.should_retry("entry-42", 2)
        );
    }

    #[test]
    fn test_gives_up_at_max_attempts() {
        let policy = policy(3);
        assert!(matches!(policy.should_retry("x", 2), RetryDecision::Retry(_)));
        assert_eq!(policy.should_retry("x", 3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = policy(100);
        let ms = delay(policy.should_retry("x", 60));
        assert!(ms <= MAX_LEDGER_RETRY_DELAY.as_millis() as i64);
    }
}
