use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::ResourceFilter;
use crate::fingerprint::{canonical_hash, normalize_for_fingerprint};
use crate::ids::{CloudProvider, ResourceId, ResourceType};
use crate::metadata::Metadata;
use crate::tags::Tags;

/// The canonical record of one cloud resource at the moment it was observed.
///
/// Identity is `(provider, account_id, region, type, id)`; `id` is globally
/// unique within a provider/region/type. `is_orphaned` is derived, not stored
/// independently, so it can never drift out of sync with `tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub provider: CloudProvider,
    pub account_id: String,
    pub region: String,
    pub resource_type: ResourceType,
    pub id: ResourceId,

    pub name: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,

    pub tags: Tags,
    pub metadata: Metadata,
}

impl Resource {
    /// A resource lacking owner and project identification tags and not
    /// explicitly marked managed.
    pub fn is_orphaned(&self) -> bool {
        self.tags.lacks_ownership()
    }

    pub fn is_blessed(&self) -> bool {
        self.tags.is_blessed()
    }

    /// `true` iff every populated field of `filter` agrees with this resource.
    /// `matches(&ResourceFilter::default())` is always `true`.
    pub fn matches(&self, filter: &ResourceFilter) -> bool {
        if let Some(ids) = &filter.ids {
            if !ids.contains(&self.id) {
                return false;
            }
        }
        if let Some(t) = &filter.resource_type {
            if t != &self.resource_type {
                return false;
            }
        }
        if let Some(region) = &filter.region {
            if region != &self.region {
                return false;
            }
        }
        if let Some(provider) = &filter.provider {
            if provider != &self.provider {
                return false;
            }
        }
        if let Some(owner) = &filter.owner {
            if self.tags.owner.as_ref() != Some(owner) {
                return false;
            }
        }
        if let Some(managed) = filter.managed {
            if self.tags.managed != Some(managed) {
                return false;
            }
        }
        true
    }

    /// Canonical fingerprint used by the change detector to decide whether a
    /// resource has meaningfully changed between two observations.
    ///
    /// Excludes `last_seen_at` (and any other time-of-observation field) so
    /// that re-observing an unchanged resource never produces a spurious
    /// `modified` event. Vector-valued metadata fields are sorted first so
    /// provider list-ordering nondeterminism can't cause flapping. `null`,
    /// `""`, and `0` are normalized away before hashing so a provider that
    /// reports an unset field inconsistently across ticks (`None` one tick,
    /// `Some("")` or `Some(0)` the next) can't cause a spurious `modified`
    /// event either.
    pub fn diff_fingerprint(&self) -> String {
        let mut metadata = self.metadata.clone();
        metadata.security_groups.sort();
        metadata.attached_policies.sort();

        let body = serde_json::json!({
            "provider": self.provider,
            "account_id": self.account_id,
            "region": self.region,
            "resource_type": self.resource_type,
            "id": self.id,
            "name": self.name,
            "status": self.status,
            "created_at": self.created_at,
            "tags": self.tags,
            "metadata": metadata,
        });
        canonical_hash(&normalize_for_fingerprint(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample(id: &str) -> Resource {
        Resource {
            provider: CloudProvider::Aws,
            account_id: "111".into(),
            region: "us-east-1".into(),
            resource_type: ResourceType::new("ec2_instance"),
            id: ResourceId::new(id),
            name: Some("web-1".into()),
            status: Some("running".into()),
            created_at: Some(Utc::now()),
            last_seen_at: Some(Utc::now()),
            tags: Tags::from_map(&HashMap::new()),
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let r = sample("i-1");
        assert!(r.matches(&ResourceFilter::default()));
    }

    #[test]
    fn filter_narrows_by_type() {
        let r = sample("i-1");
        let f = ResourceFilter::default().with_type("ec2_instance");
        assert!(r.matches(&f));
        let f2 = ResourceFilter::default().with_type("s3_bucket");
        assert!(!r.matches(&f2));
    }

    #[test]
    fn fingerprint_excludes_last_seen_at() {
        let mut a = sample("i-1");
        let mut b = a.clone();
        a.last_seen_at = Some(Utc::now());
        b.last_seen_at = Some(a.last_seen_at.unwrap() + chrono::Duration::hours(3));
        assert_eq!(a.diff_fingerprint(), b.diff_fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_status() {
        let a = sample("i-1");
        let mut b = a.clone();
        b.status = Some("stopped".into());
        assert_ne!(a.diff_fingerprint(), b.diff_fingerprint());
    }

    #[test]
    fn fingerprint_ignores_metadata_list_order() {
        let mut a = sample("i-1");
        let mut b = a.clone();
        a.metadata.security_groups = vec!["sg-a".into(), "sg-b".into()];
        b.metadata.security_groups = vec!["sg-b".into(), "sg-a".into()];
        assert_eq!(a.diff_fingerprint(), b.diff_fingerprint());
        let _ = &mut a; // silence unused-mut across cfg variants
    }

    #[test]
    fn fingerprint_treats_unset_empty_string_and_zero_as_equivalent() {
        let mut a = sample("i-1");
        a.status = None;
        a.metadata.vcpus = None;
        let mut b = sample("i-1");
        b.status = Some(String::new());
        b.metadata.vcpus = Some(0);
        assert_eq!(a.diff_fingerprint(), b.diff_fingerprint());
    }

    #[test]
    fn orphan_derivation() {
        let mut r = sample("i-1");
        assert!(r.is_orphaned());
        r.tags.owner = Some("alice".into());
        assert!(!r.is_orphaned());
    }
}
