use driftwatch_policy::PolicyResult;
use driftwatch_store::EnforcementEvent;

/// The outcome of one `scan` invocation — grounded in `reconciler::ReconcileOutcome`,
/// reshaped here so the CLI crate doesn't need to depend on the daemon's
/// internal tick plumbing beyond the summary it prints.
pub struct ScanSummary {
    pub revision: u64,
    pub resources_observed: usize,
    pub change_events: usize,
}

pub fn render_scan_summary(summary: &ScanSummary) -> String {
    format!(
        "revision {}: {} resource(s) observed, {} change event(s)",
        summary.revision, summary.resources_observed, summary.change_events
    )
}

pub fn render_status(revision: u64, resource_count: usize, recent: &[EnforcementEvent]) -> String {
    let mut out = format!("revision: {revision}\nresources tracked: {resource_count}\n");
    if recent.is_empty() {
        out.push_str("no enforcement events recorded\n");
        return out;
    }
    out.push_str("recent enforcement events:\n");
    for event in recent {
        let error = event.error.as_ref().map(|e| format!(": {e}")).unwrap_or_default();
        out.push_str(&format!(
            "  {} {} {} -> {} ({}){}\n",
            event.timestamp.to_rfc3339(),
            event.resource_id,
            event.action,
            event.decision,
            if event.success { "ok" } else { "failed" },
            error,
        ));
    }
    out
}

pub fn render_policy_result(result: &PolicyResult) -> String {
    let matched = if result.matched_policies.is_empty() {
        "-".to_string()
    } else {
        result.matched_policies.join(", ")
    };
    format!(
        "decision={} action={} risk={} confidence={:.2}\nreason: {}\nmatched: {matched}",
        result.decision, result.action, result.risk, result.confidence, result.reason,
    )
}
