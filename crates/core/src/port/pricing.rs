// Pricing Port

use crate::domain::Price;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current price per photo.
///
/// Read once per admission; the value is copied into the entry.
pub trait PricingProvider: Send + Sync {
    fn current_unit_price(&self) -> Price;

    fn set_unit_price(&self, price: Price);
}

/// Process-wide price held in memory
pub struct InMemoryPricing {
    unit_price: AtomicU64,
}

impl InMemoryPricing {
    pub fn new(unit_price: Price) -> Self {
        Self {
            unit_price: AtomicU64::new(unit_price),
        }
    }
}

impl PricingProvider for InMemoryPricing {
    fn current_unit_price(&self) -> Price {
        self.unit_price.load(Ordering::SeqCst)
    }

    fn set_unit_price(&self, price: Price) {
        self.unit_price.store(price, Ordering::SeqCst);
    }
}
