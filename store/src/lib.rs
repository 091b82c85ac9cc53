//! Policy storage for channelblam.
//!
//! Every storage backend (LMDB, in-memory) implements [`PolicyStore`]. The
//! engine depends only on the trait, so backends can be swapped without
//! touching enforcement logic.

pub mod error;
pub mod memory;
pub mod policy;
pub mod record;

pub use error::StoreError;
pub use memory::MemoryPolicyStore;
pub use policy::PolicyStore;
pub use record::PolicyRecord;
