//! Policy store trait.

use crate::StoreError;
use blam_types::{ChannelId, PolicyState};

/// Keyed storage of one [`PolicyState`] per channel.
///
/// Implementations must guarantee:
/// - `get` of an unknown channel returns `PolicyState::new(channel)`, not an error.
/// - `mutate` is an atomic read-modify-write. Two mutations of the same channel
///   never interleave; mutations of different channels may run concurrently.
/// - A successful `mutate` is visible to every later `get`, from any caller.
pub trait PolicyStore: Send + Sync {
    /// Read the current state of a channel.
    fn get(&self, channel: &ChannelId) -> Result<PolicyState, StoreError>;

    /// Apply `f` to the channel's state and persist the result.
    ///
    /// Returns the state as written.
    fn mutate(
        &self,
        channel: &ChannelId,
        f: &mut dyn FnMut(&mut PolicyState),
    ) -> Result<PolicyState, StoreError>;

    /// Every channel that has a stored record.
    fn channels(&self) -> Result<Vec<ChannelId>, StoreError>;
}
