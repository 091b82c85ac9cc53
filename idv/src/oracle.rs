use async_trait::async_trait;
use blam_types::MemberId;

use crate::OracleError;

/// Answers whether a member has passed identity verification.
///
/// Implementations must not cache answers across calls: verification status
/// can change between enforcement passes.
#[async_trait]
pub trait IdvOracle: Send + Sync {
    async fn is_verified(&self, member: &MemberId) -> Result<bool, OracleError>;
}
