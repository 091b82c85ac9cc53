//! Nullable collaborators for deterministic testing.
//!
//! The engine reaches the outside world through three seams: the identity
//! oracle, the channel roster, and the policy store. This crate provides
//! in-process implementations of each that:
//! - Return scripted, deterministic answers
//! - Record every call for later assertions
//! - Never touch the filesystem or network
//!
//! Usage: hand these to `PolicyEngine::new` in place of the real backends.

pub mod oracle;
pub mod roster;
pub mod store;

pub use oracle::NullOracle;
pub use roster::NullRoster;
pub use store::NullPolicyStore;
