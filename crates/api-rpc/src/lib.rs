//! JSON-RPC API Layer
//!
//! JSON-RPC 2.0 server for the PhotoQueue engine: queue commands,
//! administration, and a delta subscription over WebSocket.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
