//! Per-channel policy state.

use crate::ids::{ChannelId, MemberId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether IDV enforcement is active for a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Unlocked,
    Locked,
}

/// Everything the engine persists about one channel.
///
/// An empty state (unlocked, no entries) is a valid steady state and is what
/// a store returns for a channel it has never seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyState {
    pub channel: ChannelId,
    /// IDV enforcement flag.
    #[serde(default)]
    pub idv_locked: bool,
    /// Members removed unconditionally, whitelist notwithstanding.
    #[serde(default)]
    pub blamlist: BTreeSet<MemberId>,
    /// Members exempt from IDV enforcement only.
    #[serde(default)]
    pub whitelist: BTreeSet<MemberId>,
}

impl PolicyState {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            idv_locked: false,
            blamlist: BTreeSet::new(),
            whitelist: BTreeSet::new(),
        }
    }

    pub fn is_blammed(&self, member: &MemberId) -> bool {
        self.blamlist.contains(member)
    }

    pub fn is_whitelisted(&self, member: &MemberId) -> bool {
        self.whitelist.contains(member)
    }

    pub fn lock_state(&self) -> LockState {
        if self.idv_locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.idv_locked && self.blamlist.is_empty() && self.whitelist.is_empty()
    }

    /// Whether an enforcement pass over this channel could remove anyone.
    pub fn needs_enforcement(&self) -> bool {
        self.idv_locked || !self.blamlist.is_empty()
    }
}
