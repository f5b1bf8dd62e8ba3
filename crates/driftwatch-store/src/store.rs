use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driftwatch_domain::{Resource, ResourceId};

use crate::error::StoreError;
use crate::model::{ChangeEvent, EnforcementEvent, EnforcementFilter, Observation};

/// The append-only, versioned state backing one daemon instance.
///
/// A single writer at a time; readers never block on a writer and never see
/// a torn batch (`record_observation_batch` is atomic end to end).
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Atomically write one observation per resource under a freshly
    /// allocated revision, and advance `latest` for each id. Resources not
    /// present in the batch are left alone — disappearance is the
    /// detector's job, not the store's.
    async fn record_observation_batch(&self, resources: Vec<Resource>) -> Result<u64, StoreError>;

    /// Atomically append a batch of change events, assigning an `event_id`
    /// to any that don't already carry one.
    async fn store_change_event_batch(&self, events: Vec<ChangeEvent>) -> Result<(), StoreError>;

    /// Append one enforcement record.
    async fn store_enforcement(&self, event: EnforcementEvent) -> Result<(), StoreError>;

    /// The resource body of the highest-revisioned observation for every id
    /// currently tracked. This is the detector's "before" side.
    async fn latest_resource_set(&self) -> Result<Vec<Resource>, StoreError>;

    /// Observations of one resource, ordered by revision ascending,
    /// optionally bounded to those observed at or after `since`.
    async fn resource_history(
        &self,
        id: &ResourceId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, StoreError>;

    /// Enforcement events matching `filter`.
    async fn query_enforcements(&self, filter: &EnforcementFilter) -> Result<Vec<EnforcementEvent>, StoreError>;

    /// The current revision counter (0 if no batch has ever been recorded).
    async fn current_revision(&self) -> Result<u64, StoreError>;

    /// Retention hook. A documented no-op in the core; callers that need
    /// compaction provide their own store implementation.
    async fn compact(&self, before_revision: u64) -> Result<(), StoreError> {
        let _ = before_revision;
        Ok(())
    }
}
