// Port Layer - Interfaces for external collaborators

pub mod authorizer;
pub mod id_provider; // For deterministic testing
pub mod ledger;
pub mod pricing;
pub mod time_provider;

// Re-exports
pub use authorizer::{AllowAllAuthorizer, Authorizer, OperatorIdentity, StaticTokenAuthorizer};
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
pub use ledger::{LedgerError, LedgerSink, TracingLedgerSink};
pub use pricing::{InMemoryPricing, PricingProvider};
pub use time_provider::{SystemTimeProvider, TimeProvider};
