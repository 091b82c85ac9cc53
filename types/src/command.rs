//! The closed set of policy commands and their outcomes.

use crate::decision::RemovalDecision;
use crate::error::ErrorKind;
use crate::ids::{ChannelId, MemberId};
use crate::outcome::{EnforcementReport, RemovalOutcome};
use serde::{Deserialize, Serialize};

/// What an operation needs from the invoking actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Changes policy state or the roster.
    Mutating,
    /// Observes only.
    ReadOnly,
}

/// Who to whitelist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistTarget {
    Member(MemberId),
    /// Everyone in the roster at call time. Later joiners are not covered.
    AllCurrentMembers,
}

/// A parsed command, ready for the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Blam { member: MemberId },
    Unblam { member: MemberId },
    List,
    LockIdv,
    UnlockIdv,
    IdvTest,
    WhitelistAdd { target: WhitelistTarget },
    WhitelistRemove { member: MemberId },
    WhitelistList,
    Enforce,
}

impl Command {
    pub fn capability(&self) -> Capability {
        match self {
            Self::Blam { .. }
            | Self::Unblam { .. }
            | Self::LockIdv
            | Self::UnlockIdv
            | Self::WhitelistAdd { .. }
            | Self::WhitelistRemove { .. }
            | Self::Enforce => Capability::Mutating,
            Self::List | Self::IdvTest | Self::WhitelistList => Capability::ReadOnly,
        }
    }

    /// The user-facing command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blam { .. } => "blam",
            Self::Unblam { .. } => "remove",
            Self::List => "list",
            Self::LockIdv => "idv",
            Self::UnlockIdv => "idv off",
            Self::IdvTest => "idv test",
            Self::WhitelistAdd { .. } => "whitelist",
            Self::WhitelistRemove { .. } => "whitelist remove",
            Self::WhitelistList => "whitelist list",
            Self::Enforce => "enforce",
        }
    }
}

/// A command together with who issued it and where.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub channel: ChannelId,
    pub actor: MemberId,
    /// Whether the platform granted the actor elevated channel permissions
    /// (channel manager or workspace admin).
    #[serde(default)]
    pub elevated: bool,
    pub command: Command,
}

impl Invocation {
    /// Thin permission guard: mutating commands need elevated permissions
    /// unless the actor is the configured administrator.
    pub fn authorize(&self, admin: Option<&MemberId>) -> Result<(), ErrorKind> {
        match self.command.capability() {
            Capability::ReadOnly => Ok(()),
            Capability::Mutating if self.elevated || admin == Some(&self.actor) => Ok(()),
            Capability::Mutating => Err(ErrorKind::PermissionDenied),
        }
    }
}

/// Result of a whitelist addition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistChange {
    /// Every member the command targeted.
    pub targeted: Vec<MemberId>,
    /// The subset that was not already whitelisted.
    pub newly_added: Vec<MemberId>,
}

/// Structured result of a dispatched command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// `outcome` is `None` when the removal was cancelled before it started.
    Blammed { outcome: Option<RemovalOutcome> },
    Unblammed { member: MemberId, was_blammed: bool },
    Blamlist { members: Vec<MemberId> },
    Enforced { report: EnforcementReport },
    Unlocked { was_locked: bool },
    DryRun { decision: RemovalDecision },
    Whitelisted { change: WhitelistChange },
    WhitelistRemoved { member: MemberId, was_whitelisted: bool },
    Whitelist { members: Vec<MemberId> },
}
