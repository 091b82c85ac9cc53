//! LMDB storage backend for channelblam.
//!
//! Implements [`blam_store::PolicyStore`] using the `heed` LMDB bindings. One
//! environment holds a `policies` database (channel id → bincode
//! [`blam_store::PolicyRecord`]) and a `meta` database for the schema version.

pub mod environment;
pub mod error;
pub mod policy;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use policy::LmdbPolicyStore;
