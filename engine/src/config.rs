//! Engine configuration.

use blam_types::MemberId;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default timeout applied to every external call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of removals in flight per batch.
pub const DEFAULT_MAX_CONCURRENT_REMOVALS: usize = 4;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// The account the engine acts as. Never removed.
    pub actor_id: MemberId,
    /// The configured administrator. Never removed, and invited into
    /// channels the actor joins.
    pub admin_id: Option<MemberId>,
    /// Upper bound on any single oracle, roster, or store call.
    pub call_timeout: Duration,
    /// Removals in flight per batch.
    pub max_concurrent_removals: usize,
    pub retry: RetryPolicy,
}

impl EngineConfig {
    pub fn new(actor_id: MemberId) -> Self {
        Self {
            actor_id,
            admin_id: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_concurrent_removals: DEFAULT_MAX_CONCURRENT_REMOVALS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_admin(mut self, admin_id: MemberId) -> Self {
        self.admin_id = Some(admin_id);
        self
    }

    pub fn exemptions(&self) -> Exemptions {
        Exemptions {
            actor: self.actor_id.clone(),
            admin: self.admin_id.clone(),
        }
    }
}

/// Identities that are never selected for removal, whatever the policy says.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exemptions {
    pub actor: MemberId,
    pub admin: Option<MemberId>,
}

impl Exemptions {
    pub fn covers(&self, member: &MemberId) -> bool {
        &self.actor == member || self.admin.as_ref() == Some(member)
    }
}
