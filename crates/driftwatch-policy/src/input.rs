use std::collections::HashMap;

use chrono::{DateTime, Utc};
use driftwatch_domain::Resource;
use driftwatch_store::Observation;

/// Everything the policy engine knows about the environment a resource lives
/// in, derived once per evaluation rather than recomputed per module.
#[derive(Debug, Clone, Default)]
pub struct PolicyContext {
    pub account: String,
    pub region: String,
    pub environment: String,
    pub resource_age_days: Option<i64>,
    pub last_seen_days: Option<i64>,
    pub change_frequency: Option<u32>,
    pub team_policies: HashMap<String, String>,
}

/// The input every [`crate::module::PolicyModule`] evaluates against.
#[derive(Debug, Clone)]
pub struct PolicyInput {
    pub resource: Resource,
    pub history: Vec<Observation>,
    pub context: PolicyContext,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
}

/// `environment` tag wins; otherwise fall back to a name-pattern match
/// against `prod|stag|dev|test`. Resources that match neither are
/// `"unknown"`.
pub fn infer_environment(resource: &Resource) -> String {
    if let Some(tag) = &resource.tags.environment {
        return tag.clone();
    }
    let name = resource.name.as_deref().unwrap_or(resource.id.as_str()).to_ascii_lowercase();
    for candidate in ["prod", "stag", "dev", "test"] {
        if name.contains(candidate) {
            return candidate.to_string();
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_domain::{CloudProvider, Metadata, ResourceId, ResourceType, Tags};
    use std::collections::HashMap as Map;

    fn resource(name: &str) -> Resource {
        Resource {
            provider: CloudProvider::Aws,
            account_id: "1".into(),
            region: "us-east-1".into(),
            resource_type: ResourceType::new("ec2_instance"),
            id: ResourceId::new("i-1"),
            name: Some(name.to_string()),
            status: None,
            created_at: None,
            last_seen_at: None,
            tags: Tags::from_map(&Map::new()),
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn environment_tag_wins_over_name() {
        let mut r = resource("dev-box");
        r.tags.environment = Some("prod".to_string());
        assert_eq!(infer_environment(&r), "prod");
    }

    #[test]
    fn falls_back_to_name_pattern() {
        assert_eq!(infer_environment(&resource("web-prod-1")), "prod");
        assert_eq!(infer_environment(&resource("staging-box")), "stag");
        assert_eq!(infer_environment(&resource("nameless-thing")), "unknown");
    }
}
