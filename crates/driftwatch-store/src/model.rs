use std::collections::HashMap;

use chrono::{DateTime, Utc};
use driftwatch_domain::{CloudProvider, EnforcementAction, PolicyDecision, Resource, ResourceId, ResourceType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable snapshot of one resource at one revision. Created by the
/// store during batch ingest; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub revision: u64,
    pub resource: Resource,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Modified,
    Disappeared,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeType::Created => "created",
            ChangeType::Modified => "modified",
            ChangeType::Disappeared => "disappeared",
        };
        write!(f, "{}", s)
    }
}

/// A typed diff record produced by the change detector and persisted
/// append-only, tied to the revision that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub revision: u64,
    pub event_id: Uuid,
    pub resource_id: ResourceId,
    pub change_type: ChangeType,
    pub previous: Option<Resource>,
    pub current: Option<Resource>,
    pub detected_at: DateTime<Utc>,
    pub fields_changed: Option<Vec<String>>,
}

impl ChangeEvent {
    pub fn created(revision: u64, resource: Resource, detected_at: DateTime<Utc>) -> Self {
        Self {
            revision,
            event_id: Uuid::new_v4(),
            resource_id: resource.id.clone(),
            change_type: ChangeType::Created,
            previous: None,
            current: Some(resource),
            detected_at,
            fields_changed: None,
        }
    }

    pub fn disappeared(revision: u64, resource: Resource, detected_at: DateTime<Utc>) -> Self {
        Self {
            revision,
            event_id: Uuid::new_v4(),
            resource_id: resource.id.clone(),
            change_type: ChangeType::Disappeared,
            previous: Some(resource),
            current: None,
            detected_at,
            fields_changed: None,
        }
    }

    pub fn modified(
        revision: u64,
        previous: Resource,
        current: Resource,
        fields_changed: Vec<String>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            revision,
            event_id: Uuid::new_v4(),
            resource_id: current.id.clone(),
            change_type: ChangeType::Modified,
            previous: Some(previous),
            current: Some(current),
            detected_at,
            fields_changed: Some(fields_changed),
        }
    }
}

/// A policy-driven side effect, plus its audit record. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub resource_id: ResourceId,
    pub resource_type: ResourceType,
    pub provider: CloudProvider,
    pub action: EnforcementAction,
    pub decision: PolicyDecision,
    pub reason: String,
    pub tags_applied: Option<HashMap<String, String>>,
    pub success: bool,
    pub error: Option<String>,
}

/// Narrows a [`EnforcementEvent`] query. An empty filter returns everything.
#[derive(Debug, Clone, Default)]
pub struct EnforcementFilter {
    pub ids: Option<Vec<ResourceId>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub action: Option<EnforcementAction>,
    pub decision: Option<PolicyDecision>,
}

impl EnforcementFilter {
    pub fn matches(&self, event: &EnforcementEvent) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&event.resource_id) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }
        if let Some(action) = self.action {
            if action != event.action {
                return false;
            }
        }
        if let Some(decision) = self.decision {
            if decision != event.decision {
                return false;
            }
        }
        true
    }
}
