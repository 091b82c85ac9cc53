//! On-disk representation of a channel's policy.

use blam_types::{ChannelId, MemberId, PolicyState};
use serde::{Deserialize, Serialize};

/// Flat, backend-neutral form of [`PolicyState`]:
/// `{channel_id, idv_locked, blamlist: [member_id], whitelist: [member_id]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub channel_id: String,
    pub idv_locked: bool,
    pub blamlist: Vec<String>,
    pub whitelist: Vec<String>,
}

impl From<&PolicyState> for PolicyRecord {
    fn from(state: &PolicyState) -> Self {
        Self {
            channel_id: state.channel.as_str().to_string(),
            idv_locked: state.idv_locked,
            blamlist: state.blamlist.iter().map(|m| m.as_str().to_string()).collect(),
            whitelist: state.whitelist.iter().map(|m| m.as_str().to_string()).collect(),
        }
    }
}

impl From<PolicyRecord> for PolicyState {
    fn from(record: PolicyRecord) -> Self {
        Self {
            channel: ChannelId::new(record.channel_id),
            idv_locked: record.idv_locked,
            blamlist: record.blamlist.into_iter().map(MemberId::new).collect(),
            whitelist: record.whitelist.into_iter().map(MemberId::new).collect(),
        }
    }
}
