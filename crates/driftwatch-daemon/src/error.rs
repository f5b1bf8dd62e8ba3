use driftwatch_policy::PolicyError;
use driftwatch_provider::ProviderError;
use driftwatch_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("metrics server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("supervised task panicked or was aborted: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
