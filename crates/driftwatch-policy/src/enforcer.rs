use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use driftwatch_domain::{EnforcementAction, Resource};
use driftwatch_provider::Provider;
use driftwatch_store::{EnforcementEvent, Store};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::PolicyError;
use crate::notifier::Notifier;
use crate::result::PolicyResult;

/// Carries out exactly one side effect for a [`PolicyResult`] and persists
/// an audit record of what happened.
///
/// The persist call runs on a separate spawned task so enforcement latency
/// never stalls the reconciliation tick; `execute`'s return value reflects
/// only the action's own success or failure, never a storage error.
pub struct Enforcer {
    provider: Option<Arc<dyn Provider>>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    tag_namespace: String,
}

impl Enforcer {
    pub fn new(
        provider: Option<Arc<dyn Provider>>,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        tag_namespace: impl Into<String>,
    ) -> Self {
        Self { provider, store, notifier, tag_namespace: tag_namespace.into() }
    }

    pub async fn execute(&self, resource: &Resource, result: &PolicyResult) -> Result<(), PolicyError> {
        let timestamp = Utc::now();

        let (success, error, tags_applied) = match result.action {
            EnforcementAction::Ignore => (true, None, None),
            EnforcementAction::Notify => {
                info!(resource_id = %resource.id, reason = %result.reason, "enforcement: notify");
                self.notifier.notify(resource, result).await;
                (true, None, None)
            }
            EnforcementAction::Flag => self.flag(resource, result).await,
        };

        let event = EnforcementEvent {
            event_id: Uuid::new_v4(),
            timestamp,
            resource_id: resource.id.clone(),
            resource_type: resource.resource_type.clone(),
            provider: resource.provider.clone(),
            action: result.action,
            decision: result.decision,
            reason: result.reason.clone(),
            tags_applied,
            success,
            error: error.clone(),
        };

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.store_enforcement(event).await {
                warn!(error = %e, "failed to persist enforcement event");
            }
        });

        match (success, error) {
            (true, _) => Ok(()),
            (false, Some(message)) => Err(PolicyError::EnforcementFailed(message)),
            (false, None) => Err(PolicyError::EnforcementFailed("unknown enforcement failure".to_string())),
        }
    }

    async fn flag(
        &self,
        resource: &Resource,
        result: &PolicyResult,
    ) -> (bool, Option<String>, Option<HashMap<String, String>>) {
        let Some(provider) = &self.provider else {
            debug!(resource_id = %resource.id, "dry-run: no provider configured, skipping tag_resource");
            return (true, None, None);
        };

        let flag_key = format!("{}:policy-flag", self.tag_namespace);
        let reason_key = format!("{}:policy-reason", self.tag_namespace);

        if let Err(e) = provider.tag_resource(&resource.id, &flag_key, &result.decision.to_string()).await {
            return (false, Some(e.to_string()), None);
        }
        if let Err(e) = provider.tag_resource(&resource.id, &reason_key, &result.reason).await {
            return (false, Some(e.to_string()), None);
        }

        let mut applied = HashMap::new();
        applied.insert(flag_key, result.decision.to_string());
        applied.insert(reason_key, result.reason.clone());
        (true, None, Some(applied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_domain::{CloudProvider, Metadata, PolicyDecision, ResourceId, ResourceType, Risk, Tags};
    use driftwatch_provider::LocalProvider;
    use driftwatch_store::{EnforcementFilter, InMemoryStore};
    use std::collections::HashMap as Map;
    use std::time::Duration;

    use crate::notifier::LoggingNotifier;

    fn resource() -> Resource {
        Resource {
            provider: CloudProvider::Local,
            account_id: "acct".into(),
            region: "local".into(),
            resource_type: ResourceType::new("demo"),
            id: ResourceId::new("i-123"),
            name: None,
            status: None,
            created_at: None,
            last_seen_at: None,
            tags: Tags::from_map(&Map::new()),
            metadata: Metadata::default(),
        }
    }

    fn deny_flag_result() -> PolicyResult {
        PolicyResult {
            decision: PolicyDecision::Deny,
            action: EnforcementAction::Flag,
            reason: "missing tags".to_string(),
            confidence: 0.9,
            matched_policies: vec!["orphan-tagging".to_string()],
            risk: Risk::High,
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn s4_flag_tags_resource_and_persists_success() {
        let provider = Arc::new(LocalProvider::new(vec![resource()]));
        let store = Arc::new(InMemoryStore::new());
        let enforcer = Enforcer::new(
            Some(provider.clone()),
            store.clone(),
            Arc::new(LoggingNotifier),
            "driftwatch",
        );

        enforcer.execute(&resource(), &deny_flag_result()).await.unwrap();

        let tagged = provider.list_resources(&Default::default()).await.unwrap();
        assert_eq!(tagged[0].tags.to_map().get("driftwatch:policy-flag").map(String::as_str), Some("deny"));
        assert_eq!(tagged[0].tags.to_map().get("driftwatch:policy-reason").map(String::as_str), Some("missing tags"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let events = store
            .query_enforcements(&EnforcementFilter { ids: Some(vec![ResourceId::new("i-123")]), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].success);
    }

    #[tokio::test]
    async fn s5_enforcement_failure_is_captured() {
        let provider = Arc::new(LocalProvider::new(vec![])); // resource not present -> NotFound
        let store = Arc::new(InMemoryStore::new());
        let enforcer = Enforcer::new(
            Some(provider.clone()),
            store.clone(),
            Arc::new(LoggingNotifier),
            "driftwatch",
        );

        let err = enforcer.execute(&resource(), &deny_flag_result()).await.unwrap_err();
        assert!(matches!(err, PolicyError::EnforcementFailed(_)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let events = store.query_enforcements(&EnforcementFilter::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert!(events[0].error.is_some());
    }

    #[tokio::test]
    async fn dry_run_without_provider_still_succeeds() {
        let store = Arc::new(InMemoryStore::new());
        let enforcer = Enforcer::new(None, store.clone(), Arc::new(LoggingNotifier), "driftwatch");
        enforcer.execute(&resource(), &deny_flag_result()).await.unwrap();
    }

    #[tokio::test]
    async fn ignore_action_still_persists_a_record() {
        let store = Arc::new(InMemoryStore::new());
        let enforcer = Enforcer::new(None, store.clone(), Arc::new(LoggingNotifier), "driftwatch");
        let result = PolicyResult::no_match();
        enforcer.execute(&resource(), &result).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        let events = store.query_enforcements(&EnforcementFilter::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EnforcementAction::Ignore);
    }
}
