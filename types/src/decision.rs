//! Removal decisions computed by an enforcement pass.

use crate::ids::{ChannelId, MemberId};
use serde::{Deserialize, Serialize};

/// Why a member was selected for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The member is on the channel blamlist.
    Blammed,
    /// The channel is IDV-locked and the member is neither whitelisted nor verified.
    IdvFailed,
}

/// One member selected for removal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedMember {
    pub member: MemberId,
    pub reason: RemovalReason,
}

/// The members to remove from a channel for one roster snapshot.
///
/// Entries keep roster order so execution follows join order when the
/// roster source provides it. The set of members never depends on that order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalDecision {
    pub channel: ChannelId,
    pub to_remove: Vec<MarkedMember>,
}

impl RemovalDecision {
    pub fn empty(channel: ChannelId) -> Self {
        Self {
            channel,
            to_remove: Vec::new(),
        }
    }

    /// Select `member` for removal. A member already marked keeps its first reason.
    pub fn mark(&mut self, member: MemberId, reason: RemovalReason) {
        if !self.contains(&member) {
            self.to_remove.push(MarkedMember { member, reason });
        }
    }

    pub fn reason_for(&self, member: &MemberId) -> Option<RemovalReason> {
        self.to_remove
            .iter()
            .find(|m| &m.member == member)
            .map(|m| m.reason)
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.reason_for(member).is_some()
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberId> {
        self.to_remove.iter().map(|m| &m.member)
    }

    pub fn len(&self) -> usize {
        self.to_remove.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty()
    }
}
