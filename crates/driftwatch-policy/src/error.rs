use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy compile error in module '{module}': {message}")]
    CompileError { module: String, message: String },

    #[error("unknown policy module: {0}")]
    UnknownModule(String),

    #[error("enforcement action failed: {0}")]
    EnforcementFailed(String),

    #[error("provider error: {0}")]
    Provider(#[from] driftwatch_provider::ProviderError),

    #[error("store error: {0}")]
    Store(#[from] driftwatch_store::StoreError),
}
