use blam_idv::OracleError;
use blam_roster::RosterError;
use blam_store::StoreError;
use blam_types::ErrorKind;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The external dependency a call was made to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collaborator {
    Store,
    Roster,
    Oracle,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Store => "policy store",
            Self::Roster => "roster",
            Self::Oracle => "identity oracle",
        })
    }
}

/// Failures that abort a whole engine operation.
///
/// Per-member removal failures never show up here; they are recorded in the
/// operation's outcome instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("policy store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("roster unavailable: {0}")]
    Roster(#[from] RosterError),

    #[error("identity oracle unavailable: {0}")]
    Oracle(#[from] OracleError),

    #[error("{collaborator} call timed out after {after:?}")]
    Timeout {
        collaborator: Collaborator,
        after: Duration,
    },

    #[error("'{command}' requires elevated channel permissions")]
    PermissionDenied { command: &'static str },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(_) => ErrorKind::StoreUnavailable,
            Self::Roster(e) => e.kind(),
            Self::Oracle(e) => e.kind(),
            Self::Timeout { collaborator, .. } => match collaborator {
                Collaborator::Store => ErrorKind::StoreUnavailable,
                Collaborator::Roster => ErrorKind::RosterUnavailable,
                Collaborator::Oracle => ErrorKind::OracleUnavailable,
            },
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
        }
    }
}
