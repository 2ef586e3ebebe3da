// PhotoQueue Core - Queue state machine, command processor, change broadcaster
// NO network or file dependencies: adapters live in their own crates

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
