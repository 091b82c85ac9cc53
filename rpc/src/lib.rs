//! HTTP server for the channelblam engine.
//!
//! Provides endpoints for:
//! - Structured command invocations
//! - Slash-command text (`/blam`, `/idv`)
//! - Member-joined events
//! - Channel policy snapshots
//! - Engine counters and health

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::RpcServer;
