use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("list_resources failed: {0}")]
    ListFailed(String),

    #[error("{0} does not support day-2 enforcement actions")]
    UnsupportedAction(&'static str),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("provider not registered: {0}")]
    NotRegistered(String),

    #[error("internal provider error: {0}")]
    Internal(String),
}
