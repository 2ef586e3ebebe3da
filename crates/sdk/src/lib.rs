//! PhotoQueue SDK - Rust Client Library
//!
//! Typed calls for every daemon method, plus a `QueueWatcher` that mirrors
//! the live queue over WebSocket.
//!
//! # Example
//!
//! ```no_run
//! use photoqueue_sdk::{PhotoQueueClient, QueueWatcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PhotoQueueClient::connect("http://127.0.0.1:9630").await?;
//!     let mut watcher = QueueWatcher::start(client).await?;
//!
//!     while let Some(state) = watcher.changed().await? {
//!         for (position, entry) in state.active_queue() {
//!             println!("{}. {} ({})", position, entry.name, entry.status);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;
mod watcher;

pub use client::{EventStream, PhotoQueueClient};
pub use error::{code, Result, SdkError};
pub use types::{
    EntryStatus, LocationChange, NewEntry, OperationalStatus, PaymentMethod, PriceChange,
    QueueEntry, QueueEvent, QueueSnapshot, QueueStats, ResetResponse, StatusChange,
};
pub use watcher::QueueWatcher;
