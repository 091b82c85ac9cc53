//! Membership policy engine.
//!
//! For a channel and a roster snapshot the engine decides who must go
//! (blammed members always; unverified, non-whitelisted members while the
//! channel is IDV-locked), then executes removals against the roster source
//! with per-member failure isolation, bounded concurrency, and bounded retry
//! on rate limiting.
//!
//! Layout:
//! - [`decision`]: the single membership predicate, shared by live and dry runs.
//! - [`executor`]: the removal phase.
//! - [`engine`]: [`PolicyEngine`] operations over store, oracle, and roster.
//! - [`dispatch`]: maps [`blam_types::Command`]s onto engine operations.
//! - [`parse`]: slash-command text front-end.

pub mod cancel;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod executor;
pub mod parse;
pub mod retry;
pub mod spans;

pub use cancel::CancelToken;
pub use config::{EngineConfig, Exemptions};
pub use engine::PolicyEngine;
pub use error::{Collaborator, EngineError};
pub use executor::RemovalExecutor;
pub use parse::{parse_blam_text, parse_idv_text, parse_mention, ParseError};
pub use retry::RetryPolicy;
