// Domain Layer - Pure business logic and entities

pub mod entry;
pub mod error;
pub mod event;
pub mod location;
pub mod status;

// Re-exports
pub use entry::{EntryId, EntryStatus, NewEntry, PaymentMethod, Price, QueueEntry};
pub use error::DomainError;
pub use event::{QueueEvent, QueueSnapshot, Revision};
pub use location::LocationRegistry;
pub use status::{AdmissionPolicy, OperationalStatus};
