//! Policy engine operations.

use blam_idv::IdvOracle;
use blam_roster::{Roster, RosterError};
use blam_store::{PolicyStore, StoreError};
use blam_types::{
    ChannelId, EnforcementReport, ErrorKind, MemberId, MemberJoinOutcome, PolicyState,
    RemovalDecision, RemovalOutcome, RemovalReason, RemovalResult, WhitelistChange,
    WhitelistTarget,
};
use blam_utils::StatsCounter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::Instrument;

use crate::cancel::CancelToken;
use crate::config::{EngineConfig, Exemptions};
use crate::decision::decide;
use crate::error::{Collaborator, EngineError};
use crate::executor::RemovalExecutor;
use crate::spans;

pub const STAT_PASSES: &str = "enforcement_passes";
pub const STAT_REMOVED: &str = "members_removed";
pub const STAT_ALREADY_ABSENT: &str = "members_already_absent";
pub const STAT_FAILED: &str = "removals_failed";
pub const STAT_NOT_STARTED: &str = "removals_not_started";
pub const STAT_BLAMS: &str = "blams";

const STAT_NAMES: &[&str] = &[
    STAT_PASSES,
    STAT_REMOVED,
    STAT_ALREADY_ABSENT,
    STAT_FAILED,
    STAT_NOT_STARTED,
    STAT_BLAMS,
];

/// Decides and enforces channel membership policy.
///
/// Holds no policy state of its own: every operation reads the
/// [`PolicyStore`] afresh, and every write goes through the store's atomic
/// per-channel `mutate`. Verification answers are never cached.
pub struct PolicyEngine {
    store: Arc<dyn PolicyStore>,
    oracle: Arc<dyn IdvOracle>,
    roster: Arc<dyn Roster>,
    exemptions: Exemptions,
    executor: RemovalExecutor,
    call_timeout: Duration,
    stats: StatsCounter,
}

impl PolicyEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn PolicyStore>,
        oracle: Arc<dyn IdvOracle>,
        roster: Arc<dyn Roster>,
    ) -> Self {
        let executor = RemovalExecutor::new(
            Arc::clone(&roster),
            config.retry.clone(),
            config.max_concurrent_removals,
            config.call_timeout,
        );
        Self {
            store,
            oracle,
            roster,
            exemptions: config.exemptions(),
            executor,
            call_timeout: config.call_timeout,
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    pub fn exemptions(&self) -> &Exemptions {
        &self.exemptions
    }

    // ── Blamlist ───────────────────────────────────────────────────────

    /// Blamlist `member` and remove them right away.
    ///
    /// The blamlist entry stays even if the removal fails; later passes and
    /// join checks retry it. Returns `None` when `cancel` had already fired
    /// and no removal was started.
    pub async fn blam(
        &self,
        channel: &ChannelId,
        member: &MemberId,
        cancel: &CancelToken,
    ) -> Result<Option<RemovalOutcome>, EngineError> {
        self.ensure_actor_present(channel).await;
        let entry = member.clone();
        self.mutate(channel, move |s| {
            s.blamlist.insert(entry.clone());
        })
        .await?;
        self.stats.increment(STAT_BLAMS);
        tracing::info!(channel = %channel, member = %member, "blammed member");

        if self.exemptions.covers(member) {
            tracing::warn!(channel = %channel, member = %member, "blammed an exempt identity; not removing");
            return Ok(Some(RemovalOutcome {
                member: member.clone(),
                reason: RemovalReason::Blammed,
                result: RemovalResult::Failed(ErrorKind::Exempt),
            }));
        }
        if cancel.is_cancelled() {
            tracing::info!(channel = %channel, member = %member, "cancelled; removal not started");
            self.stats.increment(STAT_NOT_STARTED);
            return Ok(None);
        }

        let outcome = self
            .executor
            .remove_one(channel, member, RemovalReason::Blammed, cancel)
            .await;
        self.record_outcomes(std::slice::from_ref(&outcome));
        Ok(Some(outcome))
    }

    /// Take `member` off the blamlist. Does not re-invite them.
    ///
    /// Returns whether they were blamlisted.
    pub async fn unblam(&self, channel: &ChannelId, member: &MemberId) -> Result<bool, EngineError> {
        let member = member.clone();
        let channel = channel.clone();
        self.store_call(move |store| {
            let mut was_blammed = false;
            store.mutate(&channel, &mut |s| was_blammed = s.blamlist.remove(&member))?;
            if was_blammed {
                tracing::info!(channel = %channel, member = %member, "unblammed member");
            }
            Ok(was_blammed)
        })
        .await
    }

    /// Blamlist snapshot.
    pub async fn list(&self, channel: &ChannelId) -> Result<Vec<MemberId>, EngineError> {
        Ok(self.policy(channel).await?.blamlist.into_iter().collect())
    }

    // ── IDV lock ───────────────────────────────────────────────────────

    /// Lock the channel to verified members and run one enforcement pass.
    pub async fn lock_idv(
        &self,
        channel: &ChannelId,
        cancel: &CancelToken,
    ) -> Result<EnforcementReport, EngineError> {
        let state = self.mutate(channel, |s| s.idv_locked = true).await?;
        tracing::info!(channel = %channel, "IDV lock enabled");
        self.enforce_state(state, cancel).await
    }

    /// Lift the IDV lock. Nobody is re-invited.
    ///
    /// Returns whether the channel was locked.
    pub async fn unlock_idv(&self, channel: &ChannelId) -> Result<bool, EngineError> {
        let channel = channel.clone();
        self.store_call(move |store| {
            let mut was_locked = false;
            store.mutate(&channel, &mut |s| {
                was_locked = s.idv_locked;
                s.idv_locked = false;
            })?;
            tracing::info!(channel = %channel, was_locked, "IDV lock disabled");
            Ok(was_locked)
        })
        .await
    }

    /// The decision a lock would produce right now, with no side effects.
    pub async fn idv_test(&self, channel: &ChannelId) -> Result<RemovalDecision, EngineError> {
        let mut state = self.policy(channel).await?;
        state.idv_locked = true;
        self.decide_for(&state)
            .instrument(spans::enforcement_span(channel, true))
            .await
    }

    // ── Whitelist ──────────────────────────────────────────────────────

    /// Exempt members from IDV enforcement.
    ///
    /// [`WhitelistTarget::AllCurrentMembers`] captures the roster as it is
    /// now; members who join later are not covered.
    pub async fn whitelist_add(
        &self,
        channel: &ChannelId,
        target: WhitelistTarget,
    ) -> Result<WhitelistChange, EngineError> {
        let targeted = match target {
            WhitelistTarget::Member(member) => vec![member],
            WhitelistTarget::AllCurrentMembers => self.fetch_roster(channel).await?,
        };

        let to_add = targeted.clone();
        let channel = channel.clone();
        let newly_added = self
            .store_call(move |store| {
                let mut newly_added = Vec::new();
                store.mutate(&channel, &mut |s| {
                    newly_added.clear();
                    for member in &to_add {
                        if s.whitelist.insert(member.clone()) {
                            newly_added.push(member.clone());
                        }
                    }
                })?;
                tracing::info!(
                    channel = %channel,
                    targeted = to_add.len(),
                    added = newly_added.len(),
                    "whitelisted members"
                );
                Ok(newly_added)
            })
            .await?;

        Ok(WhitelistChange {
            targeted,
            newly_added,
        })
    }

    /// Take `member` off the whitelist. Returns whether they were on it.
    pub async fn whitelist_remove(
        &self,
        channel: &ChannelId,
        member: &MemberId,
    ) -> Result<bool, EngineError> {
        let member = member.clone();
        let channel = channel.clone();
        self.store_call(move |store| {
            let mut was_whitelisted = false;
            store.mutate(&channel, &mut |s| was_whitelisted = s.whitelist.remove(&member))?;
            Ok(was_whitelisted)
        })
        .await
    }

    /// Whitelist snapshot.
    pub async fn whitelist(&self, channel: &ChannelId) -> Result<Vec<MemberId>, EngineError> {
        Ok(self.policy(channel).await?.whitelist.into_iter().collect())
    }

    // ── Enforcement ────────────────────────────────────────────────────

    /// One enforcement pass using the stored policy.
    pub async fn enforce(
        &self,
        channel: &ChannelId,
        cancel: &CancelToken,
    ) -> Result<EnforcementReport, EngineError> {
        let state = self.policy(channel).await?;
        self.enforce_state(state, cancel).await
    }

    /// Re-enforce every channel whose policy could remove someone.
    ///
    /// A failure in one channel is logged and reported without stopping the
    /// sweep. Cancellation stops the sweep between channels.
    pub async fn sweep(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<(ChannelId, Result<EnforcementReport, EngineError>)>, EngineError> {
        let channels = self.store_call(|store| store.channels()).await?;
        let mut results = Vec::new();
        for channel in channels {
            if cancel.is_cancelled() {
                tracing::info!("sweep cancelled");
                break;
            }
            let result = match self.policy(&channel).await {
                Ok(state) if !state.needs_enforcement() => continue,
                Ok(state) => self.enforce_state(state, cancel).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::warn!(channel = %channel, kind = %e.kind(), "sweep failed for channel: {e}");
            }
            results.push((channel, result));
        }
        Ok(results)
    }

    /// React to a member joining a channel.
    ///
    /// When the enforcement actor itself joins, the administrator is invited
    /// after it. Anyone else is checked against the channel policy and
    /// removed if they fail it.
    pub async fn member_joined(
        &self,
        channel: &ChannelId,
        member: &MemberId,
        cancel: &CancelToken,
    ) -> Result<MemberJoinOutcome, EngineError> {
        self.check_joined_member(channel, member, cancel)
            .instrument(spans::member_joined_span(channel, member))
            .await
    }

    /// Current policy of a channel (default-empty when unknown).
    pub async fn policy(&self, channel: &ChannelId) -> Result<PolicyState, EngineError> {
        let channel = channel.clone();
        self.store_call(move |store| store.get(&channel)).await
    }

    // ── Internals ──────────────────────────────────────────────────────

    async fn enforce_state(
        &self,
        state: PolicyState,
        cancel: &CancelToken,
    ) -> Result<EnforcementReport, EngineError> {
        self.ensure_actor_present(&state.channel).await;
        let span = spans::enforcement_span(&state.channel, false);
        self.run_pass(state, cancel).instrument(span).await
    }

    /// Join the channel before removing anyone from it.
    ///
    /// Best effort: a failure is logged and the removals that follow report
    /// their own errors.
    async fn ensure_actor_present(&self, channel: &ChannelId) {
        match timeout(self.call_timeout, self.roster.join(channel)).await {
            Ok(Ok(())) | Ok(Err(RosterError::AlreadyPresent)) => {}
            Ok(Err(e)) => tracing::warn!(channel = %channel, kind = %e.kind(), "failed to join channel: {e}"),
            Err(_) => tracing::warn!(channel = %channel, "joining channel timed out"),
        }
    }

    async fn run_pass(
        &self,
        state: PolicyState,
        cancel: &CancelToken,
    ) -> Result<EnforcementReport, EngineError> {
        let decision = self.decide_for(&state).await?;
        let report = self.executor.execute(decision, cancel).await;
        self.stats.increment(STAT_PASSES);
        self.stats.add(STAT_NOT_STARTED, report.not_started.len() as u64);
        self.record_outcomes(&report.outcomes);
        tracing::info!(
            marked = report.decision.len(),
            removed = report.removed().count(),
            failed = report.failed().count(),
            "enforcement pass complete"
        );
        Ok(report)
    }

    async fn check_joined_member(
        &self,
        channel: &ChannelId,
        member: &MemberId,
        cancel: &CancelToken,
    ) -> Result<MemberJoinOutcome, EngineError> {
        if member == &self.exemptions.actor {
            return Ok(self.invite_admin(channel).await);
        }

        let state = self.policy(channel).await?;
        if !state.needs_enforcement() {
            return Ok(MemberJoinOutcome::Retained);
        }

        let decision = decide(
            &state,
            std::slice::from_ref(member),
            self.oracle.as_ref(),
            &self.exemptions,
            self.call_timeout,
        )
        .await?;
        let Some(mark) = decision.to_remove.first() else {
            return Ok(MemberJoinOutcome::Retained);
        };

        let outcome = self
            .executor
            .remove_one(channel, &mark.member, mark.reason, cancel)
            .await;
        self.record_outcomes(std::slice::from_ref(&outcome));
        tracing::info!(reason = ?mark.reason, result = ?outcome.result, "removed member on join");
        Ok(MemberJoinOutcome::Removed { outcome })
    }

    async fn decide_for(&self, state: &PolicyState) -> Result<RemovalDecision, EngineError> {
        let roster = self.fetch_roster(&state.channel).await?;
        decide(state, &roster, self.oracle.as_ref(), &self.exemptions, self.call_timeout).await
    }

    async fn fetch_roster(&self, channel: &ChannelId) -> Result<Vec<MemberId>, EngineError> {
        timeout(self.call_timeout, self.roster.list(channel))
            .await
            .map_err(|_| EngineError::Timeout {
                collaborator: Collaborator::Roster,
                after: self.call_timeout,
            })?
            .map_err(EngineError::from)
    }

    async fn invite_admin(&self, channel: &ChannelId) -> MemberJoinOutcome {
        let Some(admin) = &self.exemptions.admin else {
            return MemberJoinOutcome::Retained;
        };
        let result = match timeout(self.call_timeout, self.roster.add(channel, admin)).await {
            Ok(Ok(())) | Ok(Err(RosterError::AlreadyPresent)) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!(channel = %channel, admin = %admin, "failed to invite admin: {e}");
                Err(e.kind())
            }
            Err(_) => {
                tracing::warn!(channel = %channel, admin = %admin, "admin invite timed out");
                Err(ErrorKind::RosterUnavailable)
            }
        };
        MemberJoinOutcome::AdminInvited { result }
    }

    fn record_outcomes(&self, outcomes: &[RemovalOutcome]) {
        for outcome in outcomes {
            match outcome.result {
                RemovalResult::Success => self.stats.increment(STAT_REMOVED),
                RemovalResult::AlreadyAbsent => self.stats.increment(STAT_ALREADY_ABSENT),
                RemovalResult::Failed(_) => self.stats.increment(STAT_FAILED),
            }
        }
    }

    async fn mutate<F>(&self, channel: &ChannelId, mut f: F) -> Result<PolicyState, EngineError>
    where
        F: FnMut(&mut PolicyState) + Send + 'static,
    {
        let channel = channel.clone();
        self.store_call(move |store| store.mutate(&channel, &mut f)).await
    }

    /// Run a blocking store call off the async runtime, bounded by the call timeout.
    ///
    /// A blocking task cannot be aborted. After a timeout the call keeps
    /// running and a mutation may still commit, so `StoreUnavailable` from a
    /// write means "outcome unknown", not "nothing changed". Every mutation
    /// the engine makes is idempotent, so retrying is safe.
    async fn store_call<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&dyn PolicyStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));
        match timeout(self.call_timeout, task).await {
            Ok(Ok(result)) => result.map_err(EngineError::from),
            Ok(Err(e)) => Err(EngineError::Store(StoreError::Backend(format!(
                "store task failed: {e}"
            )))),
            Err(_) => Err(EngineError::Timeout {
                collaborator: Collaborator::Store,
                after: self.call_timeout,
            }),
        }
    }
}
