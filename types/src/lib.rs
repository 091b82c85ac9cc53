//! Fundamental types for channelblam.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! member and channel identifiers, per-channel policy state, removal decisions and
//! outcomes, the error taxonomy, and the closed command set.

pub mod command;
pub mod decision;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod policy;

pub use command::{Capability, Command, CommandOutcome, Invocation, WhitelistChange, WhitelistTarget};
pub use decision::{MarkedMember, RemovalDecision, RemovalReason};
pub use error::ErrorKind;
pub use ids::{ChannelId, MemberId};
pub use outcome::{EnforcementReport, MemberJoinOutcome, RemovalOutcome, RemovalResult};
pub use policy::{LockState, PolicyState};
