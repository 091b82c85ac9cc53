//! Per-member removal outcomes and enforcement reports.

use crate::decision::{RemovalDecision, RemovalReason};
use crate::error::ErrorKind;
use crate::ids::MemberId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalResult {
    Success,
    /// The member had already left. Counts as success.
    AlreadyAbsent,
    Failed(ErrorKind),
}

impl RemovalResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyAbsent)
    }
}

/// The result of one attempted removal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalOutcome {
    pub member: MemberId,
    pub reason: RemovalReason,
    pub result: RemovalResult,
}

/// Decision plus execution results of one enforcement pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementReport {
    pub decision: RemovalDecision,
    /// Outcomes of removals that were started, in decision order.
    pub outcomes: Vec<RemovalOutcome>,
    /// Members never attempted because the pass was cancelled.
    #[serde(default)]
    pub not_started: Vec<MemberId>,
}

impl EnforcementReport {
    pub fn outcome_for(&self, member: &MemberId) -> Option<&RemovalOutcome> {
        self.outcomes.iter().find(|o| &o.member == member)
    }

    pub fn removed(&self) -> impl Iterator<Item = &RemovalOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RemovalOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_success())
    }

    pub fn was_cancelled(&self) -> bool {
        !self.not_started.is_empty()
    }
}

/// What happened when a member joined a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberJoinOutcome {
    /// The enforcement actor joined; the administrator was invited after it.
    AdminInvited { result: Result<(), ErrorKind> },
    /// The member passed the channel policy.
    Retained,
    /// The member failed the channel policy and removal was attempted.
    Removed { outcome: RemovalOutcome },
}
