use driftwatch_domain::{EnforcementAction, PolicyDecision, Risk};

use crate::input::PolicyInput;
use crate::module::PolicyModule;
use crate::result::PolicyResult;

/// Flags orphaned resources (no owner/project tag, not explicitly managed)
/// running in a production environment.
pub struct OrphanTaggingModule;

impl PolicyModule for OrphanTaggingModule {
    fn name(&self) -> &str {
        "orphan-tagging"
    }

    fn evaluate(&self, input: &PolicyInput) -> Option<PolicyResult> {
        if !input.resource.is_orphaned() || input.environment != "prod" {
            return None;
        }
        Some(PolicyResult {
            decision: PolicyDecision::Flag,
            action: EnforcementAction::Flag,
            reason: "orphaned resource with no owner or project tag in production".to_string(),
            confidence: 0.9,
            matched_policies: vec![self.name().to_string()],
            risk: Risk::Medium,
            metadata: Default::default(),
        })
    }
}

/// Flags resources that haven't been observed recently, per a configurable
/// staleness threshold.
pub struct StaleResourceModule {
    pub threshold_days: i64,
}

impl StaleResourceModule {
    pub fn new(threshold_days: i64) -> Self {
        Self { threshold_days }
    }
}

impl PolicyModule for StaleResourceModule {
    fn name(&self) -> &str {
        "stale-resource"
    }

    fn evaluate(&self, input: &PolicyInput) -> Option<PolicyResult> {
        let last_seen_days = input.context.last_seen_days?;
        if last_seen_days < self.threshold_days {
            return None;
        }
        Some(PolicyResult {
            decision: PolicyDecision::Flag,
            action: EnforcementAction::Flag,
            reason: format!("not observed in {last_seen_days} days (threshold {})", self.threshold_days),
            confidence: 0.75,
            matched_policies: vec![self.name().to_string()],
            risk: Risk::Low,
            metadata: Default::default(),
        })
    }
}
