use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("schema mismatch: expected version {expected}, found {found}")]
    SchemaMismatch { expected: u64, found: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal store error: {0}")]
    Internal(String),

    #[error("store directory already locked by another process: {0}")]
    LockHeld(String),
}
