//! Shared fixtures for the cross-crate tests

use photoqueue_core::application::CommandProcessor;
use photoqueue_core::config::EngineConfig;
use photoqueue_core::port::time_provider::mocks::ManualClock;
use photoqueue_core::port::{InMemoryPricing, SequentialIdProvider};
use std::sync::Arc;

pub const UNIT_PRICE: u64 = 5000;

/// Processor with deterministic ids (`e-1`, `e-2`, ...) and a manual clock
pub fn processor(config: EngineConfig) -> Arc<CommandProcessor> {
    Arc::new(
        CommandProcessor::new(
            &config,
            Arc::new(InMemoryPricing::new(UNIT_PRICE)),
            Arc::new(SequentialIdProvider::new("e")),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        )
        .expect("valid engine config"),
    )
}

pub fn default_processor() -> Arc<CommandProcessor> {
    processor(EngineConfig::default())
}
