//! Span constructors for engine operations.

use blam_types::{ChannelId, MemberId};
use tracing::{info_span, Span};

/// Span covering a dispatched command.
pub fn command_span(channel: &ChannelId, actor: &MemberId, command: &str) -> Span {
    info_span!("command", channel = %channel, actor = %actor, command = %command)
}

/// Span covering one enforcement pass (decision plus execution).
pub fn enforcement_span(channel: &ChannelId, dry_run: bool) -> Span {
    info_span!("enforce", channel = %channel, dry_run)
}

/// Span covering a join-triggered check.
pub fn member_joined_span(channel: &ChannelId, member: &MemberId) -> Span {
    info_span!("member_joined", channel = %channel, member = %member)
}
