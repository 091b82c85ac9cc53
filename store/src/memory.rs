//! In-memory policy store.
//!
//! An arena of channels: the outer map is locked only long enough to find or
//! insert a channel's record, and each record has its own lock. Mutations of
//! one channel are serialized while other channels proceed in parallel.

use crate::{PolicyStore, StoreError};
use blam_types::{ChannelId, PolicyState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MemoryPolicyStore {
    channels: Mutex<HashMap<ChannelId, Arc<Mutex<PolicyState>>>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a channel's state, replacing whatever was there.
    pub fn insert(&self, state: PolicyState) -> Result<(), StoreError> {
        let record = self.record(&state.channel)?;
        let mut guard = record
            .lock()
            .map_err(|_| StoreError::Poisoned(state.channel.to_string()))?;
        *guard = state;
        Ok(())
    }

    fn record(&self, channel: &ChannelId) -> Result<Arc<Mutex<PolicyState>>, StoreError> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| StoreError::Poisoned("<arena>".to_string()))?;
        Ok(channels
            .entry(channel.clone())
            .or_insert_with(|| Arc::new(Mutex::new(PolicyState::new(channel.clone()))))
            .clone())
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn get(&self, channel: &ChannelId) -> Result<PolicyState, StoreError> {
        let record = {
            let channels = self
                .channels
                .lock()
                .map_err(|_| StoreError::Poisoned("<arena>".to_string()))?;
            channels.get(channel).cloned()
        };
        match record {
            Some(record) => record
                .lock()
                .map(|state| state.clone())
                .map_err(|_| StoreError::Poisoned(channel.to_string())),
            None => Ok(PolicyState::new(channel.clone())),
        }
    }

    fn mutate(
        &self,
        channel: &ChannelId,
        f: &mut dyn FnMut(&mut PolicyState),
    ) -> Result<PolicyState, StoreError> {
        let record = self.record(channel)?;
        let mut state = record
            .lock()
            .map_err(|_| StoreError::Poisoned(channel.to_string()))?;
        f(&mut *state);
        Ok(state.clone())
    }

    fn channels(&self) -> Result<Vec<ChannelId>, StoreError> {
        let channels = self
            .channels
            .lock()
            .map_err(|_| StoreError::Poisoned("<arena>".to_string()))?;
        let mut ids: Vec<ChannelId> = channels.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
