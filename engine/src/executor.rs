//! Removal execution phase.
//!
//! Each marked member is removed independently: one failing call never
//! blocks the rest of the batch. Rate-limited removals are retried on their
//! own, per [`RetryPolicy`]. At most `max_concurrent` removals are in flight.

use blam_roster::{Roster, RosterError};
use blam_types::{
    ChannelId, EnforcementReport, ErrorKind, MemberId, RemovalDecision, RemovalOutcome,
    RemovalReason, RemovalResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::cancel::CancelToken;
use crate::retry::RetryPolicy;

pub struct RemovalExecutor {
    roster: Arc<dyn Roster>,
    retry: RetryPolicy,
    max_concurrent: usize,
    call_timeout: Duration,
}

impl RemovalExecutor {
    pub fn new(
        roster: Arc<dyn Roster>,
        retry: RetryPolicy,
        max_concurrent: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            roster,
            retry,
            max_concurrent: max_concurrent.max(1),
            call_timeout,
        }
    }

    /// Execute every removal in `decision`.
    ///
    /// Outcomes are reported in decision order. Once `cancel` fires, no
    /// further removals start; those members are listed as not started.
    pub async fn execute(&self, decision: RemovalDecision, cancel: &CancelToken) -> EnforcementReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut in_flight = Vec::with_capacity(decision.len());
        let mut not_started = Vec::new();

        for mark in &decision.to_remove {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                not_started.push(mark.member.clone());
                continue;
            };

            let roster = Arc::clone(&self.roster);
            let retry = self.retry.clone();
            let call_timeout = self.call_timeout;
            let channel = decision.channel.clone();
            let member = mark.member.clone();
            let cancel = cancel.clone();
            let task = tokio::spawn(async move {
                let _permit = permit;
                remove_with_retry(roster.as_ref(), &channel, &member, &retry, call_timeout, &cancel).await
            });
            in_flight.push((mark.clone(), task));
        }

        let mut outcomes = Vec::with_capacity(in_flight.len());
        for (mark, task) in in_flight {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(member = %mark.member, "removal task failed: {e}");
                    RemovalResult::Failed(ErrorKind::RosterUnavailable)
                }
            };
            outcomes.push(RemovalOutcome {
                member: mark.member,
                reason: mark.reason,
                result,
            });
        }

        if !not_started.is_empty() {
            tracing::warn!(
                channel = %decision.channel,
                skipped = not_started.len(),
                "enforcement cancelled; remaining removals not started"
            );
        }

        EnforcementReport {
            decision,
            outcomes,
            not_started,
        }
    }

    /// Remove a single member outside of a batch.
    pub async fn remove_one(
        &self,
        channel: &ChannelId,
        member: &MemberId,
        reason: RemovalReason,
        cancel: &CancelToken,
    ) -> RemovalOutcome {
        let result = remove_with_retry(
            self.roster.as_ref(),
            channel,
            member,
            &self.retry,
            self.call_timeout,
            cancel,
        )
        .await;
        RemovalOutcome {
            member: member.clone(),
            reason,
            result,
        }
    }
}

async fn remove_with_retry(
    roster: &dyn Roster,
    channel: &ChannelId,
    member: &MemberId,
    retry: &RetryPolicy,
    call_timeout: Duration,
    cancel: &CancelToken,
) -> RemovalResult {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match timeout(call_timeout, roster.remove(channel, member)).await {
            Ok(Ok(())) => {
                tracing::info!(channel = %channel, member = %member, "removed member");
                return RemovalResult::Success;
            }
            Ok(Err(RosterError::AlreadyAbsent)) => {
                tracing::debug!(channel = %channel, member = %member, "member already absent");
                return RemovalResult::AlreadyAbsent;
            }
            Ok(Err(e)) => e,
            Err(_) => {
                tracing::warn!(channel = %channel, member = %member, "removal timed out after {call_timeout:?}");
                return RemovalResult::Failed(ErrorKind::RosterUnavailable);
            }
        };

        match err {
            RosterError::RateLimited { retry_after } if retry.allows_another(attempts) => {
                let delay = retry.delay_after(attempts, retry_after);
                tracing::debug!(
                    channel = %channel,
                    member = %member,
                    attempts,
                    "rate limited; retrying in {delay:?}"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return RemovalResult::Failed(ErrorKind::RateLimited),
                }
            }
            other => {
                tracing::warn!(channel = %channel, member = %member, attempts, "removal failed: {other}");
                return RemovalResult::Failed(other.kind());
            }
        }
    }
}
