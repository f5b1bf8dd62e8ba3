use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use driftwatch_domain::{Resource, ResourceFilter};
use driftwatch_policy::{infer_environment, Enforcer, PolicyContext, PolicyInput, PolicyResult, PolicySet};
use driftwatch_provider::Provider;
use driftwatch_store::{Observation, Store};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::DaemonError;
use crate::metrics;

/// The summary of one completed tick, logged and folded into metrics by the
/// caller.
pub struct ReconcileOutcome {
    pub revision: u64,
    pub resources_observed: usize,
    pub change_events: usize,
}

/// One pass of the pipeline described in the reconciliation loop design:
/// list, diff, persist, evaluate, enforce. Runs its steps strictly
/// sequentially — there is no parallelism within a tick.
///
/// A missing provider (dry-run / test mode) no-ops cleanly: it records a
/// reconciliation with zero resources rather than failing.
pub async fn tick(
    provider: Option<&Arc<dyn Provider>>,
    store: &Arc<dyn Store>,
    policy_set: &PolicySet,
    enforcer: &Enforcer,
    filter: &ResourceFilter,
    cloud_label: &str,
    region_label: &str,
) -> Result<ReconcileOutcome, DaemonError> {
    let start = Instant::now();

    let result = run_tick(provider, store, policy_set, enforcer, filter, cloud_label, region_label).await;

    let status: &'static str = if result.is_ok() { "success" } else { "failure" };
    metrics::record_reconciliation(status, cloud_label, region_label);
    metrics::record_reconciliation_duration(start.elapsed(), status);

    result
}

async fn run_tick(
    provider: Option<&Arc<dyn Provider>>,
    store: &Arc<dyn Store>,
    policy_set: &PolicySet,
    enforcer: &Enforcer,
    filter: &ResourceFilter,
    cloud_label: &str,
    region_label: &str,
) -> Result<ReconcileOutcome, DaemonError> {
    let before = store.latest_resource_set().await.map_err(|e| {
        metrics::record_storage_operation("latest_resource_set", "failure", Some("store"));
        e
    })?;

    let after = match provider {
        Some(p) => p.list_resources(filter).await?,
        None => Vec::new(),
    };

    let revision = store.record_observation_batch(after.clone()).await.map_err(|e| {
        metrics::record_storage_operation("record_observation_batch", "failure", Some("store"));
        e
    })?;
    metrics::record_storage_operation("record_observation_batch", "success", None);

    for (resource_type, count) in group_counts(&after) {
        metrics::record_resources_discovered(count, &resource_type, cloud_label, region_label);
    }

    let detected_at = Utc::now();
    let events = driftwatch_detector::diff(&before, &after, revision, detected_at);

    if !events.is_empty() {
        store.store_change_event_batch(events.clone()).await.map_err(|e| {
            metrics::record_storage_operation("store_change_event_batch", "failure", Some("store"));
            e
        })?;
        metrics::record_storage_operation("store_change_event_batch", "success", None);
    }

    for event in &events {
        let resource_type = event
            .current
            .as_ref()
            .or(event.previous.as_ref())
            .map(|r| r.resource_type.as_str())
            .unwrap_or("unknown");
        metrics::record_change_event(event, resource_type, region_label);
    }

    for resource in &after {
        if let Err(e) = evaluate_and_enforce(resource, store, policy_set, enforcer, detected_at).await {
            warn!(resource_id = %resource.id, error = %e, "policy evaluation/enforcement failed for resource, continuing tick");
        }
    }

    Ok(ReconcileOutcome { revision, resources_observed: after.len(), change_events: events.len() })
}

async fn evaluate_and_enforce(
    resource: &Resource,
    store: &Arc<dyn Store>,
    policy_set: &PolicySet,
    enforcer: &Enforcer,
    timestamp: chrono::DateTime<Utc>,
) -> Result<(), DaemonError> {
    let history = store.resource_history(&resource.id, None).await?;
    let context = build_context(resource, &history);
    let environment = infer_environment(resource);

    let input = PolicyInput {
        resource: resource.clone(),
        history,
        context,
        environment,
        timestamp,
    };

    let result = if resource.is_blessed() {
        PolicyResult::blessed()
    } else {
        policy_set.evaluate(&input)
    };

    enforcer.execute(resource, &result).await?;
    Ok(())
}

fn build_context(resource: &Resource, history: &[Observation]) -> PolicyContext {
    let now = Utc::now();
    let resource_age_days = resource.created_at.map(|created| (now - created).num_days());
    let last_seen_days = history.last().map(|obs| (now - obs.observed_at).num_days());

    PolicyContext {
        account: resource.account_id.clone(),
        region: resource.region.clone(),
        environment: infer_environment(resource),
        resource_age_days,
        last_seen_days,
        change_frequency: Some(history.len() as u32),
        team_policies: HashMap::new(),
    }
}

fn group_counts(resources: &[Resource]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for resource in resources {
        *counts.entry(resource.resource_type.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// The long-lived loop task. Ticks on `interval` until `token` is
/// cancelled; tick failures are logged and counted, never propagated —
/// the next tick always retries from scratch.
#[allow(clippy::too_many_arguments)]
pub async fn run_loop(
    provider: Option<Arc<dyn Provider>>,
    store: Arc<dyn Store>,
    policy_set: Arc<PolicySet>,
    enforcer: Arc<Enforcer>,
    filter: ResourceFilter,
    interval: Duration,
    cloud_label: String,
    region_label: String,
    ready: Arc<AtomicBool>,
    token: CancellationToken,
) -> Result<(), DaemonError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("reconciliation loop: cancellation received, stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                match tick(provider.as_ref(), &store, &policy_set, &enforcer, &filter, &cloud_label, &region_label).await {
                    Ok(outcome) => {
                        ready.store(true, Ordering::Relaxed);
                        info!(
                            revision = outcome.revision,
                            resources = outcome.resources_observed,
                            changes = outcome.change_events,
                            "reconciliation tick complete",
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "reconciliation tick failed, retrying next interval");
                    }
                }
            }
        }
    }
}
