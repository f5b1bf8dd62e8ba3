use std::sync::RwLock;

use async_trait::async_trait;
use driftwatch_domain::{Resource, ResourceFilter, ResourceId};
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::Provider;

/// An in-memory [`Provider`] seeded with a fixed resource set.
///
/// This is the primary implementation exercised by tests (the detector,
/// policy, and daemon test suites all drive a `LocalProvider` rather than a
/// mocked trait object) and doubles as the `provider: local` configuration
/// for demos that don't want real cloud credentials.
#[derive(Debug)]
pub struct LocalProvider {
    resources: RwLock<Vec<Resource>>,
    region: String,
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LocalProvider {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources: RwLock::new(resources), region: "local".to_string() }
    }

    /// Bind this provider to a specific region label instead of the default
    /// `"local"` — used by dry-run configuration that wants `region()` to
    /// echo the daemon's configured region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Replace the full resource set, simulating a fresh provider scan
    /// (creations, deletions, and in-place edits all at once).
    pub fn set_resources(&self, resources: Vec<Resource>) {
        *self.resources.write().expect("local provider lock poisoned") = resources;
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ProviderError> {
        let guard = self.resources.read().expect("local provider lock poisoned");
        Ok(guard.iter().filter(|r| r.matches(filter)).cloned().collect())
    }

    // create_resource / delete_resource fall through to the trait's default
    // `UnsupportedAction` — this is a Day-2 observability provider, not a
    // cloud control plane, even in its in-memory test double. Tests that
    // need to simulate the cloud changing out from under the daemon use
    // `set_resources` instead.

    async fn tag_resource(&self, id: &ResourceId, key: &str, value: &str) -> Result<(), ProviderError> {
        debug!(%id, key, value, "LocalProvider: tag_resource");
        let mut guard = self.resources.write().expect("local provider lock poisoned");
        let resource = guard
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let mut map = resource.tags.to_map();
        map.insert(key.to_string(), value.to_string());
        resource.tags = driftwatch_domain::Tags::from_map(&map);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_domain::{CloudProvider, Metadata, ResourceType, Tags};
    use std::collections::HashMap;

    fn sample(id: &str) -> Resource {
        Resource {
            provider: CloudProvider::Local,
            account_id: "acct".into(),
            region: "local".into(),
            resource_type: ResourceType::new("demo_instance"),
            id: ResourceId::new(id),
            name: None,
            status: Some("running".into()),
            created_at: None,
            last_seen_at: None,
            tags: Tags::from_map(&HashMap::new()),
            metadata: Metadata::default(),
        }
    }

    #[tokio::test]
    async fn list_resources_applies_filter() {
        let provider = LocalProvider::new(vec![sample("a"), sample("b")]);
        let filter = ResourceFilter::default().with_ids(vec![ResourceId::new("a")]);
        let found = provider.list_resources(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ResourceId::new("a"));
    }

    #[tokio::test]
    async fn tag_resource_merges_into_existing_tags() {
        let provider = LocalProvider::new(vec![sample("a")]);
        provider.tag_resource(&ResourceId::new("a"), "owner", "alice").await.unwrap();
        let found = provider.list_resources(&ResourceFilter::default()).await.unwrap();
        assert_eq!(found[0].tags.owner.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn create_and_delete_are_unsupported_day2_only() {
        let provider = LocalProvider::new(vec![sample("a")]);
        let create_err = provider.create_resource(&sample("b")).await.unwrap_err();
        assert!(matches!(create_err, ProviderError::UnsupportedAction("create_resource")));
        let delete_err = provider.delete_resource(&ResourceId::new("a")).await.unwrap_err();
        assert!(matches!(delete_err, ProviderError::UnsupportedAction("delete_resource")));
    }

    #[tokio::test]
    async fn set_resources_simulates_a_fresh_scan() {
        let provider = LocalProvider::new(vec![sample("a")]);
        provider.set_resources(vec![sample("b")]);
        let found = provider.list_resources(&ResourceFilter::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ResourceId::new("b"));
    }
}
