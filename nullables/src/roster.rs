//! Nullable roster: an in-memory channel membership table.

use async_trait::async_trait;
use blam_roster::{Roster, RosterError};
use blam_types::{ChannelId, MemberId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A test roster.
///
/// `remove` and `add` first consume any scripted errors queued for the
/// member, then act on the membership table. In-flight removals are counted
/// so tests can assert on concurrency bounds.
#[derive(Default)]
pub struct NullRoster {
    members: Mutex<HashMap<ChannelId, Vec<MemberId>>>,
    remove_script: Mutex<HashMap<MemberId, VecDeque<RosterError>>>,
    add_script: Mutex<HashMap<MemberId, VecDeque<RosterError>>>,
    remove_calls: Mutex<Vec<(ChannelId, MemberId)>>,
    add_calls: Mutex<Vec<(ChannelId, MemberId)>>,
    join_calls: Mutex<Vec<ChannelId>>,
    join_error: Mutex<Option<RosterError>>,
    fail_list: AtomicBool,
    list_delay: Mutex<Option<Duration>>,
    remove_delay: Mutex<Option<Duration>>,
    hanging: Mutex<HashSet<MemberId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl NullRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members<I>(self, channel: &ChannelId, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MemberId>,
    {
        self.members
            .lock()
            .unwrap()
            .entry(channel.clone())
            .or_default()
            .extend(members.into_iter().map(Into::into));
        self
    }

    /// Every removal waits this long before answering.
    pub fn with_remove_delay(self, delay: Duration) -> Self {
        *self.remove_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Every `list` waits this long before answering.
    pub fn with_list_delay(self, delay: Duration) -> Self {
        *self.list_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Removals of `member` never answer.
    pub fn hang_remove(&self, member: &MemberId) {
        self.hanging.lock().unwrap().insert(member.clone());
    }

    /// The next `join` fails with `error`.
    pub fn fail_next_join(&self, error: RosterError) {
        *self.join_error.lock().unwrap() = Some(error);
    }

    pub fn members(&self, channel: &ChannelId) -> Vec<MemberId> {
        self.members
            .lock()
            .unwrap()
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Add a member directly, bypassing scripts and call recording.
    pub fn join(&self, channel: &ChannelId, member: impl Into<MemberId>) {
        self.members
            .lock()
            .unwrap()
            .entry(channel.clone())
            .or_default()
            .push(member.into());
    }

    pub fn script_remove(&self, member: &MemberId, errors: impl IntoIterator<Item = RosterError>) {
        self.remove_script
            .lock()
            .unwrap()
            .entry(member.clone())
            .or_default()
            .extend(errors);
    }

    pub fn script_add(&self, member: &MemberId, errors: impl IntoIterator<Item = RosterError>) {
        self.add_script
            .lock()
            .unwrap()
            .entry(member.clone())
            .or_default()
            .extend(errors);
    }

    /// While set, `list` fails as if the platform were down.
    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn remove_calls(&self) -> Vec<(ChannelId, MemberId)> {
        self.remove_calls.lock().unwrap().clone()
    }

    pub fn add_calls(&self) -> Vec<(ChannelId, MemberId)> {
        self.add_calls.lock().unwrap().clone()
    }

    pub fn join_calls(&self) -> Vec<ChannelId> {
        self.join_calls.lock().unwrap().clone()
    }

    /// Highest number of removals observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_scripted(
        script: &Mutex<HashMap<MemberId, VecDeque<RosterError>>>,
        member: &MemberId,
    ) -> Option<RosterError> {
        script
            .lock()
            .unwrap()
            .get_mut(member)
            .and_then(VecDeque::pop_front)
    }

    fn apply_remove(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError> {
        if let Some(err) = Self::next_scripted(&self.remove_script, member) {
            return Err(err);
        }
        let mut table = self.members.lock().unwrap();
        let members = table.entry(channel.clone()).or_default();
        match members.iter().position(|m| m == member) {
            Some(idx) => {
                members.remove(idx);
                Ok(())
            }
            None => Err(RosterError::AlreadyAbsent),
        }
    }
}

#[async_trait]
impl Roster for NullRoster {
    async fn list(&self, channel: &ChannelId) -> Result<Vec<MemberId>, RosterError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RosterError::Unavailable("scripted outage".to_string()));
        }
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.members(channel))
    }

    async fn remove(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError> {
        self.remove_calls
            .lock()
            .unwrap()
            .push((channel.clone(), member.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let hangs = self.hanging.lock().unwrap().contains(member);
        if hangs {
            std::future::pending::<()>().await;
        }
        let delay = *self.remove_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.apply_remove(channel, member);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn add(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError> {
        self.add_calls
            .lock()
            .unwrap()
            .push((channel.clone(), member.clone()));

        if let Some(err) = Self::next_scripted(&self.add_script, member) {
            return Err(err);
        }
        let mut table = self.members.lock().unwrap();
        let members = table.entry(channel.clone()).or_default();
        if members.contains(member) {
            return Err(RosterError::AlreadyPresent);
        }
        members.push(member.clone());
        Ok(())
    }

    /// Records the call; the membership table is left alone since the
    /// actor's id is not known here.
    async fn join(&self, channel: &ChannelId) -> Result<(), RosterError> {
        self.join_calls.lock().unwrap().push(channel.clone());
        match self.join_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_then_remove_again_is_absent() {
        let channel = ChannelId::from("C1");
        let roster = NullRoster::new().with_members(&channel, ["UA"]);
        let member = MemberId::from("UA");

        roster.remove(&channel, &member).await.unwrap();
        assert!(matches!(
            roster.remove(&channel, &member).await,
            Err(RosterError::AlreadyAbsent)
        ));
        assert_eq!(roster.remove_calls().len(), 2);
    }

    #[tokio::test]
    async fn scripted_errors_are_consumed_in_order() {
        let channel = ChannelId::from("C1");
        let roster = NullRoster::new().with_members(&channel, ["UA"]);
        let member = MemberId::from("UA");
        roster.script_remove(&member, [RosterError::RateLimited { retry_after: None }]);

        assert!(matches!(
            roster.remove(&channel, &member).await,
            Err(RosterError::RateLimited { .. })
        ));
        roster.remove(&channel, &member).await.unwrap();
        assert!(roster.members(&channel).is_empty());
    }

    #[tokio::test]
    async fn add_reports_existing_members() {
        let channel = ChannelId::from("C1");
        let roster = NullRoster::new().with_members(&channel, ["UA"]);
        assert!(matches!(
            roster.add(&channel, &MemberId::from("UA")).await,
            Err(RosterError::AlreadyPresent)
        ));
        roster.add(&channel, &MemberId::from("UB")).await.unwrap();
        assert_eq!(roster.members(&channel).len(), 2);
    }

    #[tokio::test]
    async fn join_is_recorded_and_can_fail_once() {
        let roster = NullRoster::new();
        let channel = ChannelId::from("C1");
        roster.fail_next_join(RosterError::Unavailable("down".into()));

        assert!(Roster::join(&roster, &channel).await.is_err());
        Roster::join(&roster, &channel).await.unwrap();
        assert_eq!(roster.join_calls(), vec![channel.clone(), channel]);
    }

    #[tokio::test]
    async fn list_outage() {
        let roster = NullRoster::new();
        roster.fail_list(true);
        assert!(roster.list(&ChannelId::from("C1")).await.is_err());
    }
}
