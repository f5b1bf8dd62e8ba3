pub mod aws;
pub mod azure;
pub mod error;
pub mod gcp;
pub mod local;
pub mod provider;
pub mod registry;

pub use aws::{AwsProvider, AwsProviderConfig};
pub use azure::{AzureProvider, AzureProviderConfig};
pub use error::ProviderError;
pub use gcp::{GcpProvider, GcpProviderConfig};
pub use local::LocalProvider;
pub use provider::Provider;
pub use registry::ProviderRegistry;
