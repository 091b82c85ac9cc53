//! Nullable policy store: in-memory with switchable failures.

use blam_store::{MemoryPolicyStore, PolicyStore, StoreError};
use blam_types::{ChannelId, PolicyState};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Wraps [`MemoryPolicyStore`], counting committed mutations and failing
/// reads or writes on demand.
#[derive(Default)]
pub struct NullPolicyStore {
    inner: MemoryPolicyStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    mutations: AtomicUsize,
    write_delay: Mutex<Option<Duration>>,
}

impl NullPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a channel without counting it as a mutation.
    pub fn seed(&self, state: PolicyState) {
        self.inner.insert(state).unwrap();
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every mutation blocks this long before committing.
    pub fn with_write_delay(self, delay: Duration) -> Self {
        *self.write_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Number of mutations that reached the backing store.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

impl PolicyStore for NullPolicyStore {
    fn get(&self, channel: &ChannelId) -> Result<PolicyState, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("scripted read failure".to_string()));
        }
        self.inner.get(channel)
    }

    fn mutate(
        &self,
        channel: &ChannelId,
        f: &mut dyn FnMut(&mut PolicyState),
    ) -> Result<PolicyState, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("scripted write failure".to_string()));
        }
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.inner.mutate(channel, f)
    }

    fn channels(&self) -> Result<Vec<ChannelId>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("scripted read failure".to_string()));
        }
        self.inner.channels()
    }
}
