use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use driftwatch_domain::{Resource, ResourceId};
use fs2::FileExt;
use redb::{Database, ReadableTable, TableDefinition};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{ChangeEvent, EnforcementEvent, EnforcementFilter, Observation};
use crate::store::Store;

const META: TableDefinition<&str, u64> = TableDefinition::new("meta");
const OBS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("obs");
const LATEST: TableDefinition<&str, u64> = TableDefinition::new("latest");
const CHANGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("changes");
const ENFORCE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("enforce");

const SCHEMA_VERSION: u64 = 1;
const KEY_REVISION: &str = "revision";
const KEY_SCHEMA_VERSION: &str = "schema_version";

fn internal(e: impl std::fmt::Display) -> StoreError {
    StoreError::StorageUnavailable(e.to_string())
}

/// `(revision, resource_id)` encoded so byte-lexicographic order equals
/// `(revision, resource_id)` order: an 8-byte big-endian revision prefix
/// followed by the id's raw bytes.
fn obs_key(revision: u64, resource_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + resource_id.len());
    key.extend_from_slice(&revision.to_be_bytes());
    key.extend_from_slice(resource_id.as_bytes());
    key
}

fn decode_obs_key(key: &[u8]) -> (u64, String) {
    let revision = u64::from_be_bytes(key[..8].try_into().expect("obs key has 8-byte revision prefix"));
    let id = String::from_utf8_lossy(&key[8..]).into_owned();
    (revision, id)
}

/// `(revision, event_id)` — fixed-width revision prefix, fixed-width uuid suffix.
fn change_key(revision: u64, event_id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&revision.to_be_bytes());
    key.extend_from_slice(event_id.as_bytes());
    key
}

/// `(timestamp_ns, event_id)` — sorts enforcement events chronologically.
fn enforce_key(timestamp: DateTime<Utc>, event_id: Uuid) -> Vec<u8> {
    let nanos = timestamp.timestamp_nanos_opt().unwrap_or(0) as u64;
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&nanos.to_be_bytes());
    key.extend_from_slice(event_id.as_bytes());
    key
}

/// Persistent [`Store`] backed by a `redb` database file plus an advisory
/// lock file held for the daemon's lifetime.
///
/// All observations, change events, and enforcement records survive process
/// restarts. This is the implementation the daemon uses outside of tests.
pub struct RedbStore {
    db: Arc<Database>,
    write_lock: Mutex<()>,
    #[allow(dead_code)] // held open for its advisory lock, never read again
    lock_file: File,
}

impl RedbStore {
    /// Open (or create) a redb database under `dir`. Creates the directory if
    /// missing, takes an exclusive advisory lock on `<dir>/LOCK` for the
    /// lifetime of the returned handle, and validates the schema version.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(internal)?;

        let lock_file = File::create(dir.join("LOCK")).map_err(internal)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::LockHeld(dir.display().to_string()))?;

        let db = Database::create(dir.join("driftwatch.redb")).map_err(internal)?;

        {
            let wtxn = db.begin_write().map_err(internal)?;
            {
                let mut meta = wtxn.open_table(META).map_err(internal)?;
                let found = meta.get(KEY_SCHEMA_VERSION).map_err(internal)?.map(|g| g.value());
                match found {
                    None => {
                        meta.insert(KEY_SCHEMA_VERSION, SCHEMA_VERSION).map_err(internal)?;
                    }
                    Some(found) if found != SCHEMA_VERSION => {
                        return Err(StoreError::SchemaMismatch { expected: SCHEMA_VERSION, found });
                    }
                    Some(_) => {}
                }
            }
            wtxn.open_table(OBS).map_err(internal)?;
            wtxn.open_table(LATEST).map_err(internal)?;
            wtxn.open_table(CHANGES).map_err(internal)?;
            wtxn.open_table(ENFORCE).map_err(internal)?;
            wtxn.commit().map_err(internal)?;
        }

        Ok(Self { db: Arc::new(db), write_lock: Mutex::new(()), lock_file })
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn record_observation_batch(&self, resources: Vec<Resource>) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let observed_at = Utc::now();

        let wtxn = self.db.begin_write().map_err(internal)?;
        let revision = {
            let mut meta = wtxn.open_table(META).map_err(internal)?;
            let current = meta.get(KEY_REVISION).map_err(internal)?.map(|g| g.value()).unwrap_or(0);
            let revision = current + 1;
            meta.insert(KEY_REVISION, revision).map_err(internal)?;

            let mut obs = wtxn.open_table(OBS).map_err(internal)?;
            let mut latest = wtxn.open_table(LATEST).map_err(internal)?;
            for resource in resources {
                let id = resource.id.as_str().to_string();
                let observation = Observation { revision, resource, observed_at };
                let bytes = serde_json::to_vec(&observation)?;
                let key = obs_key(revision, &id);
                obs.insert(key.as_slice(), bytes.as_slice()).map_err(internal)?;
                latest.insert(id.as_str(), revision).map_err(internal)?;
            }
            revision
        };
        wtxn.commit().map_err(internal)?;
        Ok(revision)
    }

    async fn store_change_event_batch(&self, events: Vec<ChangeEvent>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(CHANGES).map_err(internal)?;
            for mut event in events {
                if event.event_id.is_nil() {
                    event.event_id = Uuid::new_v4();
                }
                let key = change_key(event.revision, event.event_id);
                let bytes = serde_json::to_vec(&event)?;
                table.insert(key.as_slice(), bytes.as_slice()).map_err(internal)?;
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn store_enforcement(&self, event: EnforcementEvent) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(ENFORCE).map_err(internal)?;
            let key = enforce_key(event.timestamp, event.event_id);
            let bytes = serde_json::to_vec(&event)?;
            table.insert(key.as_slice(), bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn latest_resource_set(&self) -> Result<Vec<Resource>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let latest = rtxn.open_table(LATEST).map_err(internal)?;
        let obs = rtxn.open_table(OBS).map_err(internal)?;

        let mut out = Vec::new();
        for entry in latest.iter().map_err(internal)? {
            let (id_guard, rev_guard) = entry.map_err(internal)?;
            let id = id_guard.value();
            let revision = rev_guard.value();
            let key = obs_key(revision, id);
            if let Some(bytes) = obs.get(key.as_slice()).map_err(internal)? {
                let observation: Observation = serde_json::from_slice(bytes.value())?;
                out.push(observation.resource);
            }
        }
        Ok(out)
    }

    async fn resource_history(
        &self,
        id: &ResourceId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(OBS).map_err(internal)?;

        let mut out = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (key_guard, value_guard) = entry.map_err(internal)?;
            let (_, decoded_id) = decode_obs_key(key_guard.value());
            if decoded_id != id.as_str() {
                continue;
            }
            let observation: Observation = serde_json::from_slice(value_guard.value())?;
            if since.map_or(true, |s| observation.observed_at >= s) {
                out.push(observation);
            }
        }
        out.sort_by_key(|o| o.revision);
        Ok(out)
    }

    async fn query_enforcements(&self, filter: &EnforcementFilter) -> Result<Vec<EnforcementEvent>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(ENFORCE).map_err(internal)?;

        let mut out = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (_key, value_guard) = entry.map_err(internal)?;
            let event: EnforcementEvent = serde_json::from_slice(value_guard.value())?;
            if filter.matches(&event) {
                out.push(event);
            }
        }
        Ok(out)
    }

    async fn current_revision(&self) -> Result<u64, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let meta = rtxn.open_table(META).map_err(internal)?;
        Ok(meta.get(KEY_REVISION).map_err(internal)?.map(|g| g.value()).unwrap_or(0))
    }
}

/// Placeholder so `enforce_key`'s timestamp math stays honest about the
/// epoch it assumes; referenced only by tests below.
#[allow(dead_code)]
fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().expect("unix epoch is representable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_domain::{CloudProvider, Metadata, ResourceType, Tags};
    use std::collections::HashMap;
    use tempfile::TempDir;

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
            tags: Tags::from_map(&HashMap::new()),
            metadata: Metadata::default(),
        }
    }

    #[tokio::test]
    async fn record_and_read_back_latest() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(dir.path()).unwrap();
        let revision = store.record_observation_batch(vec![sample("a"), sample("b")]).await.unwrap();
        assert_eq!(revision, 1);
        let latest = store.latest_resource_set().await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(store.current_revision().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        {
            let store = RedbStore::open(&path).unwrap();
            store.record_observation_batch(vec![sample("a")]).await.unwrap();
        }
        {
            let store = RedbStore::open(&path).unwrap();
            assert_eq!(store.current_revision().await.unwrap(), 1);
            let latest = store.latest_resource_set().await.unwrap();
            assert_eq!(latest.len(), 1);
        }
    }

    #[tokio::test]
    async fn second_open_while_locked_fails() {
        let dir = TempDir::new().unwrap();
        let _store = RedbStore::open(dir.path()).unwrap();
        let err = RedbStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::LockHeld(_)));
    }

    #[tokio::test]
    async fn resource_history_orders_by_revision() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(dir.path()).unwrap();
        store.record_observation_batch(vec![sample("a")]).await.unwrap();
        store.record_observation_batch(vec![sample("a")]).await.unwrap();
        let history = store.resource_history(&ResourceId::new("a"), None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].revision < history[1].revision);
    }

    #[tokio::test]
    async fn enforce_key_orders_chronologically() {
        let a = enforce_key(epoch(), Uuid::nil());
        let b = enforce_key(epoch() + chrono::Duration::seconds(1), Uuid::nil());
        assert!(a < b);
    }
}
