// Application Layer - Use Cases and Business Logic

pub mod broadcaster;
pub mod constants;
pub mod ledger;
pub mod mirror;
pub mod processor;
pub mod retry;
pub mod stats;
pub mod store;

// Re-exports
pub use broadcaster::{ChangeBroadcaster, Subscription, SubscriptionError};
pub use ledger::{
    ledger_channel, shutdown_channel, LedgerExporter, LedgerHandle, ShutdownSender, ShutdownToken,
};
pub use mirror::{ApplyOutcome, QueueMirror};
pub use processor::{CommandProcessor, LocationState};
pub use retry::{RetryDecision, RetryPolicy};
pub use stats::QueueStats;
pub use store::{ForceOutcome, QueueStore};
