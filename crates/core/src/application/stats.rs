// Queue statistics for the operator dashboard

use crate::domain::{EntryStatus, PaymentMethod, Price, QueueEntry};
use serde::{Deserialize, Serialize};

/// Counts per status and revenue from completed entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub waiting: usize,
    pub in_service: usize,
    pub done: usize,
    pub cancelled: usize,
    pub total_revenue: Price,
    pub cash_revenue: Price,
    pub electronic_revenue: Price,
}

impl QueueStats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a QueueEntry>) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            match entry.status {
                EntryStatus::Waiting => stats.waiting += 1,
                EntryStatus::InService => stats.in_service += 1,
                EntryStatus::Cancelled => stats.cancelled += 1,
                EntryStatus::Done => {
                    stats.done += 1;
                    stats.total_revenue = stats.total_revenue.saturating_add(entry.total_price);
                    match entry.payment_method {
                        Some(PaymentMethod::Cash) => {
                            stats.cash_revenue =
                                stats.cash_revenue.saturating_add(entry.total_price)
                        }
                        Some(PaymentMethod::Electronic) => {
                            stats.electronic_revenue =
                                stats.electronic_revenue.saturating_add(entry.total_price)
                        }
                        None => {}
                    }
                }
            }
        }
        stats
    }
}
