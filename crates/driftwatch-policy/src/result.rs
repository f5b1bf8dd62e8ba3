use std::collections::HashMap;

use driftwatch_domain::{EnforcementAction, PolicyDecision, Risk};

/// The outcome of evaluating a policy set (or, before aggregation, a single
/// module) against one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyResult {
    pub decision: PolicyDecision,
    pub action: EnforcementAction,
    pub reason: String,
    pub confidence: f64,
    pub matched_policies: Vec<String>,
    pub risk: Risk,
    pub metadata: HashMap<String, String>,
}

impl PolicyResult {
    /// `{allow, ignore, low, 1.0, "no policies matched"}` — the aggregation
    /// default when no module matched.
    pub fn no_match() -> Self {
        Self {
            decision: PolicyDecision::Allow,
            action: EnforcementAction::Ignore,
            reason: "no policies matched".to_string(),
            confidence: 1.0,
            matched_policies: Vec::new(),
            risk: Risk::Low,
            metadata: HashMap::new(),
        }
    }

    /// `{allow, ignore, low, 1.0, "resource is blessed"}` — blessed resources
    /// short-circuit before any module runs.
    pub fn blessed() -> Self {
        Self {
            decision: PolicyDecision::Allow,
            action: EnforcementAction::Ignore,
            reason: "resource is blessed".to_string(),
            confidence: 1.0,
            matched_policies: Vec::new(),
            risk: Risk::Low,
            metadata: HashMap::new(),
        }
    }
}
