//! Verification statuses reported by the identity service.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdvStatus {
    /// Verified and under 18.
    VerifiedEligible,
    /// Verified, but 18 or older.
    VerifiedButOver18,
    /// Anything else the service reports (pending, rejected, not found, ...).
    NotVerified(Option<String>),
}

impl IdvStatus {
    pub fn from_result(result: Option<&str>) -> Self {
        match result {
            Some("verified_eligible") => Self::VerifiedEligible,
            Some("verified_but_over_18") => Self::VerifiedButOver18,
            other => Self::NotVerified(other.map(str::to_string)),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::VerifiedEligible | Self::VerifiedButOver18)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_verified_statuses_count_as_verified() {
        assert!(IdvStatus::from_result(Some("verified_eligible")).is_verified());
        assert!(IdvStatus::from_result(Some("verified_but_over_18")).is_verified());
        assert!(!IdvStatus::from_result(Some("pending")).is_verified());
        assert!(!IdvStatus::from_result(None).is_verified());
    }

    #[test]
    fn unknown_status_is_kept_for_logging() {
        assert_eq!(
            IdvStatus::from_result(Some("rejected")),
            IdvStatus::NotVerified(Some("rejected".to_string()))
        );
    }
}
