use async_trait::async_trait;
use driftwatch_domain::{Resource, ResourceFilter};

use crate::error::ProviderError;

/// A source of truth for what actually exists in a cloud account/region.
///
/// Implementations only ever describe reality (`list_resources`) or carry out
/// narrow, reversible Day-2 actions the policy engine may enforce
/// (`create_resource`/`delete_resource`/`tag_resource`). A `Provider` never
/// reaches into driftwatch's own store; it is a pure boundary to the cloud.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// The region this provider instance is bound to.
    fn region(&self) -> &str;

    /// Enumerate every resource visible to this provider that matches
    /// `filter`. An empty filter means "everything the account/region can
    /// return". Ordering is not guaranteed; callers that need determinism
    /// (the detector) sort before comparing.
    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ProviderError>;

    /// Create a resource matching the enforcement action's intent. Most
    /// providers only support a narrow subset (e.g. tagging) and return
    /// `UnsupportedAction` for the rest.
    async fn create_resource(&self, resource: &Resource) -> Result<(), ProviderError> {
        let _ = resource;
        Err(ProviderError::UnsupportedAction("create_resource"))
    }

    /// Delete the resource identified by `id`. Destructive; enforcement
    /// modules gate this behind an explicit, high-confidence decision.
    async fn delete_resource(&self, id: &driftwatch_domain::ResourceId) -> Result<(), ProviderError> {
        let _ = id;
        Err(ProviderError::UnsupportedAction("delete_resource"))
    }

    /// Apply a tag mutation to an existing resource (the mechanism behind
    /// auto-tagging enforcement actions).
    async fn tag_resource(
        &self,
        id: &driftwatch_domain::ResourceId,
        key: &str,
        value: &str,
    ) -> Result<(), ProviderError> {
        let _ = (id, key, value);
        Err(ProviderError::UnsupportedAction("tag_resource"))
    }
}
