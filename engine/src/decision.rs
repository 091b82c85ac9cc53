//! The membership predicate.
//!
//! Live enforcement, `idv test` dry runs, sweeps, and join checks all go
//! through [`decide`], so a dry run can never disagree with the real lock.

use blam_idv::IdvOracle;
use blam_types::{MemberId, PolicyState, RemovalDecision, RemovalReason};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Exemptions;
use crate::error::{Collaborator, EngineError};

/// Select the members of `roster` that `state` says must be removed.
///
/// For each member, in roster order:
/// 1. exempt identities (actor, administrator) are always retained;
/// 2. blamlisted members are marked [`RemovalReason::Blammed`];
/// 3. if the channel is IDV-locked, members that are neither whitelisted nor
///    verified are marked [`RemovalReason::IdvFailed`];
/// 4. everyone else is retained.
///
/// The oracle is only consulted when rule 3 can apply. An oracle failure
/// aborts the whole decision; there is no partial result.
pub async fn decide(
    state: &PolicyState,
    roster: &[MemberId],
    oracle: &dyn IdvOracle,
    exemptions: &Exemptions,
    call_timeout: Duration,
) -> Result<RemovalDecision, EngineError> {
    let mut decision = RemovalDecision::empty(state.channel.clone());
    let mut seen = HashSet::with_capacity(roster.len());

    for member in roster {
        if !seen.insert(member) || exemptions.covers(member) {
            continue;
        }
        if state.is_blammed(member) {
            decision.mark(member.clone(), RemovalReason::Blammed);
            continue;
        }
        if !state.idv_locked || state.is_whitelisted(member) {
            continue;
        }
        let verified = timeout(call_timeout, oracle.is_verified(member))
            .await
            .map_err(|_| EngineError::Timeout {
                collaborator: Collaborator::Oracle,
                after: call_timeout,
            })??;
        if !verified {
            decision.mark(member.clone(), RemovalReason::IdvFailed);
        }
    }

    tracing::debug!(
        channel = %state.channel,
        roster = roster.len(),
        marked = decision.len(),
        "computed removal decision"
    );
    Ok(decision)
}
