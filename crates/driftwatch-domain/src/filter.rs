use crate::ids::{CloudProvider, ResourceId, ResourceType};

/// Narrows a [`crate::resource::Resource`] set by provider, region, type,
/// ownership, or explicit ids.
///
/// An empty filter (the `Default`) means "everything the provider can
/// enumerate in its region" — see `Resource::matches`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub resource_type: Option<ResourceType>,
    pub region: Option<String>,
    pub provider: Option<CloudProvider>,
    pub owner: Option<String>,
    pub managed: Option<bool>,
    pub ids: Option<Vec<ResourceId>>,
}

impl ResourceFilter {
    pub fn is_empty(&self) -> bool {
        self == &ResourceFilter::default()
    }

    pub fn with_type(mut self, t: impl Into<ResourceType>) -> Self {
        self.resource_type = Some(t.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_ids(mut self, ids: Vec<ResourceId>) -> Self {
        self.ids = Some(ids);
        self
    }
}
