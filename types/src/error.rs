//! Error taxonomy shared across crates.
//!
//! Collaborator errors are folded into these kinds before they reach a
//! caller; raw transport errors never cross the engine boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The identity verification oracle could not answer.
    OracleUnavailable,
    /// The roster source could not be reached or returned garbage.
    RosterUnavailable,
    /// The roster source rejected the call for rate limiting.
    RateLimited,
    /// The platform or the command guard refused the operation.
    PermissionDenied,
    /// The member was not in the channel. Benign.
    AlreadyAbsent,
    /// The member was already in the channel. Benign.
    AlreadyPresent,
    /// The policy store failed to read or write.
    StoreUnavailable,
    /// The member is the enforcement actor or the administrator.
    Exempt,
}

impl ErrorKind {
    /// Benign kinds count as success for idempotent operations.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::AlreadyAbsent | Self::AlreadyPresent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OracleUnavailable => "oracle_unavailable",
            Self::RosterUnavailable => "roster_unavailable",
            Self::RateLimited => "rate_limited",
            Self::PermissionDenied => "permission_denied",
            Self::AlreadyAbsent => "already_absent",
            Self::AlreadyPresent => "already_present",
            Self::StoreUnavailable => "store_unavailable",
            Self::Exempt => "exempt",
        }
    }
}

impl ErrorKind {
    /// Fixed caller-facing description, free of any transport detail.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::OracleUnavailable => "identity verification service unavailable",
            Self::RosterUnavailable => "channel roster unavailable",
            Self::RateLimited => "rate limited by the platform",
            Self::PermissionDenied => "permission denied",
            Self::AlreadyAbsent => "member is not in the channel",
            Self::AlreadyPresent => "member is already in the channel",
            Self::StoreUnavailable => "policy store unavailable",
            Self::Exempt => "member is exempt from removal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
