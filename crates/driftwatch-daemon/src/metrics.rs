use std::time::Duration;

use driftwatch_store::{ChangeEvent, ChangeType};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Bucket boundaries (seconds) for the reconciliation duration histogram.
const RECONCILIATION_DURATION_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// Installs the process-wide Prometheus recorder and returns a handle that
/// can render the current snapshot as text for the `/metrics` endpoint.
///
/// Called exactly once, before the reconciliation loop or the metrics
/// server start recording anything.
pub fn install() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("driftwatch.daemon.reconciliation.duration".to_string()),
            RECONCILIATION_DURATION_BUCKETS,
        )
        .expect("bucket list is non-empty")
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

pub fn record_reconciliation(status: &'static str, provider: &str, region: &str) {
    metrics::counter!(
        "driftwatch.daemon.reconciliations",
        "status" => status,
        "cloud.provider" => provider.to_string(),
        "cloud.region" => region.to_string(),
    )
    .increment(1);
}

pub fn record_reconciliation_duration(duration: Duration, status: &'static str) {
    metrics::histogram!(
        "driftwatch.daemon.reconciliation.duration",
        "status" => status,
    )
    .record(duration.as_secs_f64());
}

pub fn record_resources_discovered(count: usize, resource_type: &str, provider: &str, region: &str) {
    metrics::gauge!(
        "driftwatch.resources.discovered",
        "resource.type" => resource_type.to_string(),
        "cloud.provider" => provider.to_string(),
        "cloud.region" => region.to_string(),
    )
    .set(count as f64);
}

pub fn record_change_event(event: &ChangeEvent, resource_type: &str, region: &str) {
    let change_type = match event.change_type {
        ChangeType::Created => "created",
        ChangeType::Modified => "modified",
        ChangeType::Disappeared => "disappeared",
    };
    metrics::counter!(
        "driftwatch.change_events",
        "change.type" => change_type,
        "resource.type" => resource_type.to_string(),
        "cloud.region" => region.to_string(),
    )
    .increment(1);
}

pub fn record_storage_operation(operation: &'static str, status: &'static str, error_type: Option<&'static str>) {
    match error_type {
        Some(kind) => metrics::counter!(
            "driftwatch.storage.operations",
            "operation" => operation,
            "status" => status,
            "error.type" => kind,
        )
        .increment(1),
        None => metrics::counter!(
            "driftwatch.storage.operations",
            "operation" => operation,
            "status" => status,
        )
        .increment(1),
    }
}
