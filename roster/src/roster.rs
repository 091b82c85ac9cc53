use async_trait::async_trait;
use blam_types::{ChannelId, MemberId};

use crate::RosterError;

/// Live view of, and control over, channel membership.
///
/// Every call is fallible and may be rate limited by the platform.
#[async_trait]
pub trait Roster: Send + Sync {
    /// Current members, in join order when the platform provides it.
    ///
    /// Fails only with [`RosterError::Unavailable`].
    async fn list(&self, channel: &ChannelId) -> Result<Vec<MemberId>, RosterError>;

    /// Remove a member. [`RosterError::AlreadyAbsent`] if they were not there.
    async fn remove(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError>;

    /// Add a member. [`RosterError::AlreadyPresent`] if they were already there.
    async fn add(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError>;

    /// Make the enforcement actor itself a member of `channel`.
    ///
    /// Succeeds when the actor is already there, or when the channel type
    /// cannot be joined and membership has to come from an invite instead.
    async fn join(&self, channel: &ChannelId) -> Result<(), RosterError>;
}
