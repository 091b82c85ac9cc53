use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("record for channel {channel} is corrupted: {reason}")]
    Corruption { channel: String, reason: String },

    #[error("lock for channel {0} was poisoned by a panicking writer")]
    Poisoned(String),
}
