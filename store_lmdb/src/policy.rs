//! LMDB implementation of PolicyStore.

use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env};

use blam_store::{PolicyRecord, PolicyStore, StoreError};
use blam_types::{ChannelId, PolicyState};

use crate::LmdbError;

/// Channel policies keyed by channel id.
///
/// LMDB admits a single write transaction at a time, so every `mutate` is a
/// serialized read-modify-write inside one transaction.
pub struct LmdbPolicyStore {
    pub(crate) env: Arc<Env>,
    pub(crate) policies_db: Database<Str, Bytes>,
}

fn decode(channel: &ChannelId, bytes: &[u8]) -> Result<PolicyState, StoreError> {
    let record: PolicyRecord = bincode::deserialize(bytes).map_err(|e| StoreError::Corruption {
        channel: channel.to_string(),
        reason: e.to_string(),
    })?;
    if record.channel_id != channel.as_str() {
        return Err(StoreError::Corruption {
            channel: channel.to_string(),
            reason: format!("record belongs to channel {}", record.channel_id),
        });
    }
    Ok(record.into())
}

impl PolicyStore for LmdbPolicyStore {
    fn get(&self, channel: &ChannelId) -> Result<PolicyState, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .policies_db
            .get(&rtxn, channel.as_str())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(channel, bytes),
            None => Ok(PolicyState::new(channel.clone())),
        }
    }

    fn mutate(
        &self,
        channel: &ChannelId,
        f: &mut dyn FnMut(&mut PolicyState),
    ) -> Result<PolicyState, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut state = match self
            .policies_db
            .get(&wtxn, channel.as_str())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(channel, bytes)?,
            None => PolicyState::new(channel.clone()),
        };

        f(&mut state);

        let bytes = bincode::serialize(&PolicyRecord::from(&state)).map_err(LmdbError::from)?;
        self.policies_db
            .put(&mut wtxn, channel.as_str(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(state)
    }

    fn channels(&self) -> Result<Vec<ChannelId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.policies_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut result = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            result.push(ChannelId::new(key));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DEFAULT_MAP_SIZE;
    use crate::LmdbEnvironment;
    use blam_types::MemberId;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).expect("open env");
        (dir, env)
    }

    #[test]
    fn unknown_channel_reads_as_empty_state() {
        let (_dir, env) = temp_env();
        let store = env.policy_store();
        let state = store.get(&ChannelId::from("C404")).unwrap();
        assert!(state.is_empty());
        assert!(store.channels().unwrap().is_empty());
    }

    #[test]
    fn mutate_then_get_round_trips() {
        let (_dir, env) = temp_env();
        let store = env.policy_store();
        let channel = ChannelId::from("C1");

        let written = store
            .mutate(&channel, &mut |s| {
                s.idv_locked = true;
                s.blamlist.insert(MemberId::from("U2BB"));
                s.whitelist.insert(MemberId::from("U1AA"));
            })
            .unwrap();

        assert_eq!(store.get(&channel).unwrap(), written);
        assert_eq!(store.channels().unwrap(), vec![channel]);
    }

    #[test]
    fn mutations_accumulate() {
        let (_dir, env) = temp_env();
        let store = env.policy_store();
        let channel = ChannelId::from("C1");

        for id in ["U1AA", "U2BB", "U1AA"] {
            store
                .mutate(&channel, &mut |s| {
                    s.blamlist.insert(MemberId::from(id));
                })
                .unwrap();
        }
        assert_eq!(store.get(&channel).unwrap().blamlist.len(), 2);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let channel = ChannelId::from("C1");
        {
            let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
            env.policy_store()
                .mutate(&channel, &mut |s| s.idv_locked = true)
                .unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        assert!(env.policy_store().get(&channel).unwrap().idv_locked);
    }
}
