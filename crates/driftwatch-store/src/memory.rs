use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driftwatch_domain::{Resource, ResourceId};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{ChangeEvent, EnforcementEvent, EnforcementFilter, Observation};
use crate::store::Store;

#[derive(Debug, Default)]
struct Inner {
    revision: u64,
    observations: Vec<Observation>,
    latest: HashMap<ResourceId, u64>,
    changes: Vec<ChangeEvent>,
    enforcements: Vec<EnforcementEvent>,
}

/// In-memory implementation of [`Store`].
///
/// All data is lost on process exit. Used by the detector, policy, and
/// daemon test suites, and by `scan`/`policy check` dry runs that don't want
/// to touch disk.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn record_observation_batch(&self, resources: Vec<Resource>) -> Result<u64, StoreError> {
        let mut guard = self.inner.write().await;
        guard.revision += 1;
        let revision = guard.revision;
        let observed_at = Utc::now();

        for resource in resources {
            guard.latest.insert(resource.id.clone(), revision);
            guard.observations.push(Observation { revision, resource, observed_at });
        }
        Ok(revision)
    }

    async fn store_change_event_batch(&self, events: Vec<ChangeEvent>) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.changes.extend(events);
        Ok(())
    }

    async fn store_enforcement(&self, event: EnforcementEvent) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.enforcements.push(event);
        Ok(())
    }

    async fn latest_resource_set(&self) -> Result<Vec<Resource>, StoreError> {
        let guard = self.inner.read().await;
        let mut out = Vec::with_capacity(guard.latest.len());
        for (id, revision) in &guard.latest {
            if let Some(obs) = guard
                .observations
                .iter()
                .rev()
                .find(|o| o.revision == *revision && &o.resource.id == id)
            {
                out.push(obs.resource.clone());
            }
        }
        Ok(out)
    }

    async fn resource_history(
        &self,
        id: &ResourceId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, StoreError> {
        let guard = self.inner.read().await;
        let mut out: Vec<Observation> = guard
            .observations
            .iter()
            .filter(|o| &o.resource.id == id)
            .filter(|o| since.map_or(true, |s| o.observed_at >= s))
            .cloned()
            .collect();
        out.sort_by_key(|o| o.revision);
        Ok(out)
    }

    async fn query_enforcements(&self, filter: &EnforcementFilter) -> Result<Vec<EnforcementEvent>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.enforcements.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn current_revision(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_domain::{CloudProvider, Metadata, ResourceType, Tags};
    use std::collections::HashMap as Map;

    fn sample(id: &str) -> Resource {
        Resource {
            provider: CloudProvider::Local,
            account_id: "acct".into(),
            region: "local".into(),
            resource_type: ResourceType::new("demo"),
            id: ResourceId::new(id),
            name: None,
            status: None,
            created_at: None,
            last_seen_at: None,
            tags: Tags::from_map(&Map::new()),
            metadata: Metadata::default(),
        }
    }

    #[tokio::test]
    async fn first_batch_advances_revision_to_one() {
        let store = InMemoryStore::new();
        let revision = store.record_observation_batch(vec![sample("a"), sample("b")]).await.unwrap();
        assert_eq!(revision, 1);
        assert_eq!(store.current_revision().await.unwrap(), 1);
        let latest = store.latest_resource_set().await.unwrap();
        assert_eq!(latest.len(), 2);
    }

    #[tokio::test]
    async fn second_batch_keeps_unlisted_ids_at_old_revision() {
        let store = InMemoryStore::new();
        store.record_observation_batch(vec![sample("a"), sample("b")]).await.unwrap();
        store.record_observation_batch(vec![sample("a")]).await.unwrap();
        let latest = store.latest_resource_set().await.unwrap();
        assert_eq!(latest.len(), 2);
    }

    #[tokio::test]
    async fn resource_history_is_ordered_by_revision() {
        let store = InMemoryStore::new();
        store.record_observation_batch(vec![sample("a")]).await.unwrap();
        store.record_observation_batch(vec![sample("a")]).await.unwrap();
        let history = store.resource_history(&ResourceId::new("a"), None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].revision < history[1].revision);
    }
}
