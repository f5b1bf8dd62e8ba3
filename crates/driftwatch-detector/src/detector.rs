use std::collections::HashMap;

use chrono::{DateTime, Utc};
use driftwatch_domain::{Resource, ResourceId};
use driftwatch_store::{ChangeEvent, ChangeType};
use tracing::debug;

/// Compute the set of change events between a prior snapshot (`before`) and
/// a fresh one (`after`), stamped with the revision that produced `after`.
///
/// The detector carries no state of its own — `before` is whatever the store
/// returned from `latest_resource_set` *before* the current batch was
/// written, and `after` is the batch just fetched from the provider. Callers
/// are responsible for that ordering (§4.3 of the design).
///
/// When `before` is empty (the very first reconciliation against an empty
/// store), this returns zero events: the first observation is the baseline,
/// not a flood of synthetic `created` events.
pub fn diff(
    before: &[Resource],
    after: &[Resource],
    revision: u64,
    detected_at: DateTime<Utc>,
) -> Vec<ChangeEvent> {
    if before.is_empty() {
        debug!(resources = after.len(), "detector: empty prior state, first scan is the baseline");
        return Vec::new();
    }

    let before_map: HashMap<&ResourceId, &Resource> = before.iter().map(|r| (&r.id, r)).collect();
    let after_map: HashMap<&ResourceId, &Resource> = after.iter().map(|r| (&r.id, r)).collect();

    let mut created: Vec<ChangeEvent> = after_map
        .iter()
        .filter(|(id, _)| !before_map.contains_key(*id))
        .map(|(_, r)| ChangeEvent::created(revision, (*r).clone(), detected_at))
        .collect();
    created.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));

    let mut modified: Vec<ChangeEvent> = before_map
        .iter()
        .filter_map(|(id, b)| {
            let a = after_map.get(*id)?;
            if b.diff_fingerprint() == a.diff_fingerprint() {
                return None;
            }
            let fields = changed_fields(b, a);
            Some(ChangeEvent::modified(revision, (*b).clone(), (*a).clone(), fields, detected_at))
        })
        .collect();
    modified.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));

    let mut disappeared: Vec<ChangeEvent> = before_map
        .iter()
        .filter(|(id, _)| !after_map.contains_key(*id))
        .map(|(_, r)| ChangeEvent::disappeared(revision, (*r).clone(), detected_at))
        .collect();
    disappeared.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));

    debug!(
        created = created.len(),
        modified = modified.len(),
        disappeared = disappeared.len(),
        "detector: diff computed"
    );

    // Tie-break: created, then modified, then disappeared.
    let mut events = created;
    events.extend(modified);
    events.extend(disappeared);
    events
}

/// Top-level field names that differ between two observations of the same
/// resource, for the `ChangeEvent::fields_changed` annotation. Volatile,
/// time-of-observation fields (`last_seen_at`) are never compared here.
fn changed_fields(before: &Resource, after: &Resource) -> Vec<String> {
    let mut fields = Vec::new();
    if before.name != after.name {
        fields.push("name".to_string());
    }
    if before.status != after.status {
        fields.push("status".to_string());
    }
    if before.created_at != after.created_at {
        fields.push("created_at".to_string());
    }
    if before.tags != after.tags {
        fields.push("tags".to_string());
    }
    if before.metadata != after.metadata {
        fields.push("metadata".to_string());
    }
    if before.region != after.region {
        fields.push("region".to_string());
    }
    fields
}
