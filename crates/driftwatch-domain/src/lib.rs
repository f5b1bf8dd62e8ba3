pub mod decision;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod ids;
pub mod metadata;
pub mod resource;
pub mod tags;

pub use decision::{EnforcementAction, PolicyDecision, Risk};
pub use error::DomainError;
pub use filter::ResourceFilter;
pub use fingerprint::canonical_hash;
pub use ids::{CloudProvider, ResourceId, ResourceType};
pub use metadata::Metadata;
pub use resource::Resource;
pub use tags::Tags;
