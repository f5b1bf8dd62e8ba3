use crate::builtin::{OrphanTaggingModule, StaleResourceModule};
use crate::error::PolicyError;
use crate::input::PolicyInput;
use crate::module::PolicyModule;
use crate::result::PolicyResult;

/// A collection of named, pre-compiled rule modules, run in order against
/// every resource and aggregated into a single [`PolicyResult`].
pub struct PolicySet {
    modules: Vec<Box<dyn PolicyModule>>,
}

impl PolicySet {
    pub fn new(modules: Vec<Box<dyn PolicyModule>>) -> Self {
        Self { modules }
    }

    /// The default reference set: orphan-tagging plus stale-resource with a
    /// 30-day threshold.
    pub fn default_set() -> Self {
        Self::new(vec![Box::new(OrphanTaggingModule), Box::new(StaleResourceModule::new(30))])
    }

    /// Compile a named module from its source representation. The two
    /// reference modules are looked up by name; `source` carries their one
    /// piece of configuration (the stale threshold, as a plain integer).
    /// Any other name is a `CompileError` — this is the pluggable point a
    /// Rego-class engine would extend.
    pub fn load_module(name: &str, source: &str) -> Result<Box<dyn PolicyModule>, PolicyError> {
        match name {
            "orphan-tagging" => Ok(Box::new(OrphanTaggingModule)),
            "stale-resource" => {
                let threshold_days: i64 = source.trim().parse().map_err(|_| PolicyError::CompileError {
                    module: name.to_string(),
                    message: format!("expected an integer day threshold, got '{source}'"),
                })?;
                Ok(Box::new(StaleResourceModule::new(threshold_days)))
            }
            other => Err(PolicyError::UnknownModule(other.to_string())),
        }
    }

    /// Run every module and aggregate: `deny > require_approval > flag >
    /// allow` on decision, highest risk, winning module's action, max
    /// confidence, concatenated reasons, last-writer-wins metadata merge. A
    /// blessed resource short-circuits to an allow before any module runs.
    pub fn evaluate(&self, input: &PolicyInput) -> PolicyResult {
        if input.resource.is_blessed() {
            return PolicyResult::blessed();
        }

        let matched: Vec<PolicyResult> = self.modules.iter().filter_map(|m| m.evaluate(input)).collect();
        if matched.is_empty() {
            return PolicyResult::no_match();
        }

        let winner = matched
            .iter()
            .max_by(|a, b| (a.decision, a.risk, ordered_confidence(a.confidence)).cmp(&(
                b.decision,
                b.risk,
                ordered_confidence(b.confidence),
            )))
            .expect("matched is non-empty");

        let risk = matched.iter().map(|r| r.risk).max().expect("matched is non-empty");
        let confidence = matched.iter().map(|r| r.confidence).fold(0.0_f64, f64::max);
        let reason = matched.iter().map(|r| r.reason.as_str()).collect::<Vec<_>>().join("; ");
        let matched_policies: Vec<String> = matched.iter().flat_map(|r| r.matched_policies.clone()).collect();

        let mut metadata = std::collections::HashMap::new();
        for result in &matched {
            for (k, v) in &result.metadata {
                metadata.insert(k.clone(), v.clone());
            }
        }

        PolicyResult {
            decision: winner.decision,
            action: winner.action,
            reason,
            confidence,
            matched_policies,
            risk,
            metadata,
        }
    }
}

/// `f64` doesn't implement `Ord`; confidence values here are always finite
/// and in `[0, 1]`, so total order by bit pattern after a `[0,1]`-preserving
/// scale is safe for tie-breaking the decision winner.
fn ordered_confidence(confidence: f64) -> u64 {
    (confidence.clamp(0.0, 1.0) * 1_000_000.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PolicyContext;
    use chrono::Utc;
    use driftwatch_domain::{CloudProvider, Metadata, ResourceId, ResourceType, Tags};
    use std::collections::HashMap as Map;

    fn input(orphaned: bool, environment: &str, last_seen_days: Option<i64>, blessed: bool) -> PolicyInput {
        let mut tags = Tags::from_map(&Map::new());
        if !orphaned {
            tags.owner = Some("alice".into());
        }
        tags.blessed = Some(blessed);
        PolicyInput {
            resource: driftwatch_domain::Resource {
                provider: CloudProvider::Aws,
                account_id: "1".into(),
                region: "us-east-1".into(),
                resource_type: ResourceType::new("ec2_instance"),
                id: ResourceId::new("i-123"),
                name: None,
                status: None,
                created_at: None,
                last_seen_at: None,
                tags,
                metadata: Metadata::default(),
            },
            history: Vec::new(),
            context: PolicyContext { last_seen_days, ..Default::default() },
            environment: environment.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn no_match_defaults_to_allow() {
        let set = PolicySet::default_set();
        let result = set.evaluate(&input(false, "dev", None, false));
        assert_eq!(result, PolicyResult::no_match());
    }

    #[test]
    fn blessed_resource_short_circuits() {
        let set = PolicySet::default_set();
        let result = set.evaluate(&input(true, "prod", Some(100), true));
        assert_eq!(result, PolicyResult::blessed());
    }

    #[test]
    fn orphan_in_prod_is_flagged() {
        let set = PolicySet::default_set();
        let result = set.evaluate(&input(true, "prod", None, false));
        assert_eq!(result.decision, driftwatch_domain::PolicyDecision::Flag);
        assert_eq!(result.action, driftwatch_domain::EnforcementAction::Flag);
        assert!(result.matched_policies.contains(&"orphan-tagging".to_string()));
    }

    #[test]
    fn multiple_matches_merge_reasons_and_take_max_risk() {
        let set = PolicySet::default_set();
        let result = set.evaluate(&input(true, "prod", Some(90), false));
        assert!(result.reason.contains("orphaned"));
        assert!(result.reason.contains("not observed"));
        assert_eq!(result.risk, driftwatch_domain::Risk::Medium);
        assert_eq!(result.matched_policies.len(), 2);
    }

    #[test]
    fn load_module_rejects_unknown_name() {
        let err = PolicySet::load_module("made-up", "").unwrap_err();
        assert!(matches!(err, PolicyError::UnknownModule(_)));
    }

    #[test]
    fn load_module_compiles_stale_resource_threshold() {
        let module = PolicySet::load_module("stale-resource", "14").unwrap();
        assert_eq!(module.name(), "stale-resource");
    }

    #[test]
    fn load_module_rejects_bad_threshold() {
        let err = PolicySet::load_module("stale-resource", "not-a-number").unwrap_err();
        assert!(matches!(err, PolicyError::CompileError { .. }));
    }
}
