use blam_types::ErrorKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("member is not in the channel")]
    AlreadyAbsent,

    #[error("member is already in the channel")]
    AlreadyPresent,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyAbsent => ErrorKind::AlreadyAbsent,
            Self::AlreadyPresent => ErrorKind::AlreadyPresent,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Unavailable(_) => ErrorKind::RosterUnavailable,
        }
    }
}
