use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The fixed set of semantic tag fields the engine understands.
///
/// Cloud tags arrive as free-form `{key -> value}` maps; [`Tags::from_map`] and
/// [`Tags::to_map`] interconvert between that and this closed shape. Keys outside
/// the recognized set are dropped on `from_map` — they never reach the core model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    pub owner: Option<String>,
    pub managed: Option<bool>,
    pub blessed: Option<bool>,
    pub generation: Option<String>,
    pub claimed_at: Option<String>,
    pub environment: Option<String>,
    pub team: Option<String>,
    pub project: Option<String>,
    pub name: Option<String>,
    pub cost_center: Option<String>,
    pub application: Option<String>,
    pub contact: Option<String>,
    pub created_by: Option<String>,
    pub created_date: Option<String>,
}

/// Keys recognized by [`Tags::from_map`], in stable order (used by `to_map` too
/// so two equal `Tags` values always serialize to the same map).
const RECOGNIZED_KEYS: &[&str] = &[
    "owner",
    "managed",
    "blessed",
    "generation",
    "claimed_at",
    "environment",
    "team",
    "project",
    "name",
    "cost_center",
    "application",
    "contact",
    "created_by",
    "created_date",
];

impl Tags {
    /// Build a `Tags` value from a free-form cloud tag map. Unrecognized keys
    /// are silently dropped; `managed`/`blessed` accept `"true"`/`"false"`
    /// (case-insensitive) and otherwise parse as absent.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        Tags {
            owner: map.get("owner").cloned(),
            managed: map.get("managed").and_then(|v| parse_bool(v)),
            blessed: map.get("blessed").and_then(|v| parse_bool(v)),
            generation: map.get("generation").cloned(),
            claimed_at: map.get("claimed_at").cloned(),
            environment: map.get("environment").cloned(),
            team: map.get("team").cloned(),
            project: map.get("project").cloned(),
            name: map.get("name").cloned(),
            cost_center: map.get("cost_center").cloned(),
            application: map.get("application").cloned(),
            contact: map.get("contact").cloned(),
            created_by: map.get("created_by").cloned(),
            created_date: map.get("created_date").cloned(),
        }
    }

    /// Flatten back to a free-form map. Only populated fields are emitted, so
    /// `Tags::from_map(&tags.to_map())` round-trips on the recognized set.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        if let Some(v) = &self.owner {
            out.insert("owner".to_string(), v.clone());
        }
        if let Some(v) = self.managed {
            out.insert("managed".to_string(), v.to_string());
        }
        if let Some(v) = self.blessed {
            out.insert("blessed".to_string(), v.to_string());
        }
        if let Some(v) = &self.generation {
            out.insert("generation".to_string(), v.clone());
        }
        if let Some(v) = &self.claimed_at {
            out.insert("claimed_at".to_string(), v.clone());
        }
        if let Some(v) = &self.environment {
            out.insert("environment".to_string(), v.clone());
        }
        if let Some(v) = &self.team {
            out.insert("team".to_string(), v.clone());
        }
        if let Some(v) = &self.project {
            out.insert("project".to_string(), v.clone());
        }
        if let Some(v) = &self.name {
            out.insert("name".to_string(), v.clone());
        }
        if let Some(v) = &self.cost_center {
            out.insert("cost_center".to_string(), v.clone());
        }
        if let Some(v) = &self.application {
            out.insert("application".to_string(), v.clone());
        }
        if let Some(v) = &self.contact {
            out.insert("contact".to_string(), v.clone());
        }
        if let Some(v) = &self.created_by {
            out.insert("created_by".to_string(), v.clone());
        }
        if let Some(v) = &self.created_date {
            out.insert("created_date".to_string(), v.clone());
        }
        out
    }

    /// Whether this tag set is missing both ownership and project identification
    /// and is not explicitly marked managed. Used to derive `Resource::is_orphaned`.
    pub fn lacks_ownership(&self) -> bool {
        self.owner.is_none() && self.project.is_none() && self.managed != Some(true)
    }

    pub fn is_blessed(&self) -> bool {
        self.blessed == Some(true)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn recognized_tag_keys() -> &'static [&'static str] {
    RECOGNIZED_KEYS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_recognized_set() {
        let tags = Tags {
            owner: Some("alice".into()),
            managed: Some(true),
            blessed: Some(false),
            generation: Some("3".into()),
            claimed_at: Some("2026-01-01".into()),
            environment: Some("prod".into()),
            team: Some("platform".into()),
            project: Some("core".into()),
            name: Some("web-1".into()),
            cost_center: Some("cc-1".into()),
            application: Some("checkout".into()),
            contact: Some("alice@example.com".into()),
            created_by: Some("terraform".into()),
            created_date: Some("2025-01-01".into()),
        };
        let map = tags.to_map();
        let back = Tags::from_map(&map);
        assert_eq!(tags, back);
    }

    #[test]
    fn unrecognized_keys_are_dropped() {
        let mut map = HashMap::new();
        map.insert("owner".to_string(), "bob".to_string());
        map.insert("random-vendor-key".to_string(), "xyz".to_string());
        let tags = Tags::from_map(&map);
        assert_eq!(tags.owner.as_deref(), Some("bob"));
        let round = tags.to_map();
        assert!(!round.contains_key("random-vendor-key"));
    }

    #[test]
    fn lacks_ownership_respects_managed_flag() {
        let tags = Tags { managed: Some(true), ..Default::default() };
        assert!(!tags.lacks_ownership());

        let tags = Tags::default();
        assert!(tags.lacks_ownership());
    }
}
