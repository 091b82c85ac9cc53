use blam_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("identity service unreachable: {0}")]
    Unreachable(String),

    #[error("identity request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from identity service: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Every oracle failure surfaces as the same taxonomy kind.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::OracleUnavailable
    }
}
