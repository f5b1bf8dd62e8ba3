use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),

    #[error("invalid cloud provider: {0}")]
    InvalidProvider(String),

    #[error("invalid resource type: {0}")]
    InvalidResourceType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
