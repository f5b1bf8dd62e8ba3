use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use driftwatch_config::DaemonConfig;
use driftwatch_daemon::{reconciler, Daemon};
use driftwatch_domain::{CloudProvider, ResourceFilter, ResourceId};
use driftwatch_policy::builtin::{OrphanTaggingModule, StaleResourceModule};
use driftwatch_policy::{infer_environment, Enforcer, LoggingNotifier, Notifier, PolicyContext, PolicyInput, PolicyResult, PolicySet};
use driftwatch_provider::{AwsProvider, AwsProviderConfig, AzureProvider, AzureProviderConfig, GcpProvider, GcpProviderConfig, LocalProvider, Provider};
use driftwatch_store::{EnforcementFilter, RedbStore, Store};

use crate::output;

// ── Run ───────────────────────────────────────────────────────────────────────

pub async fn run(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let store = build_store(&config)?;
    let provider = build_provider(&config).await?;
    let policy_set = Arc::new(build_policy_set(&config));
    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);

    let daemon = Daemon::new(config, store, provider, policy_set, notifier);
    let token = daemon.cancellation_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, shutting down");
            token.cancel();
        }
    });

    daemon.start().await.context("daemon exited with an error")
}

// ── Scan ──────────────────────────────────────────────────────────────────────

pub async fn scan(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let store = build_store(&config)?;
    let provider = build_provider(&config).await?;
    let policy_set = build_policy_set(&config);
    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);
    let enforcer = Enforcer::new(provider.clone(), store.clone(), notifier, config.policy.tag_namespace.clone());
    let filter = scan_filter(&config);

    let outcome = reconciler::tick(
        provider.as_ref(),
        &store,
        &policy_set,
        &enforcer,
        &filter,
        &config.provider,
        &config.region,
    )
    .await
    .context("reconciliation tick failed")?;

    println!(
        "{}",
        output::render_scan_summary(&output::ScanSummary {
            revision: outcome.revision,
            resources_observed: outcome.resources_observed,
            change_events: outcome.change_events,
        })
    );
    Ok(())
}

// ── Status ────────────────────────────────────────────────────────────────────

const STATUS_RECENT_EVENTS: usize = 10;

pub async fn status(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let store = build_store(&config)?;

    let revision = store.current_revision().await?;
    let resources = store.latest_resource_set().await?;
    let mut events = store.query_enforcements(&EnforcementFilter::default()).await?;
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(STATUS_RECENT_EVENTS);

    println!("{}", output::render_status(revision, resources.len(), &events));
    Ok(())
}

// ── Policy check ──────────────────────────────────────────────────────────────

pub async fn policy_check(config_path: &Path, resource_id: &str) -> Result<()> {
    let config = load(config_path)?;
    let store = build_store(&config)?;

    let id = ResourceId::new(resource_id);
    let resources = store.latest_resource_set().await?;
    let resource = resources
        .into_iter()
        .find(|r| r.id == id)
        .with_context(|| format!("no observation found for resource id '{resource_id}'"))?;

    let history = store.resource_history(&id, None).await?;
    let environment = infer_environment(&resource);
    let now = Utc::now();
    let context = PolicyContext {
        account: resource.account_id.clone(),
        region: resource.region.clone(),
        environment: environment.clone(),
        resource_age_days: resource.created_at.map(|created| (now - created).num_days()),
        last_seen_days: history.last().map(|obs| (now - obs.observed_at).num_days()),
        change_frequency: Some(history.len() as u32),
        team_policies: HashMap::new(),
    };
    let input = PolicyInput { resource: resource.clone(), history, context, environment, timestamp: now };

    let policy_set = build_policy_set(&config);
    let result = if resource.is_blessed() { PolicyResult::blessed() } else { policy_set.evaluate(&input) };

    println!("{}", output::render_policy_result(&result));
    Ok(())
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn load(config_path: &Path) -> Result<DaemonConfig> {
    driftwatch_config::load_config(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))
}

fn build_store(config: &DaemonConfig) -> Result<Arc<dyn Store>> {
    let store = RedbStore::open(&config.storage_path)
        .with_context(|| format!("failed to open store at {}", config.storage_path.display()))?;
    Ok(Arc::new(store))
}

fn build_policy_set(config: &DaemonConfig) -> PolicySet {
    PolicySet::new(vec![
        Box::new(OrphanTaggingModule),
        Box::new(StaleResourceModule::new(config.policy.stale_after_days as i64)),
    ])
}

fn scan_filter(config: &DaemonConfig) -> ResourceFilter {
    let mut filter = ResourceFilter::default();
    if let Ok(provider) = CloudProvider::from_str(&config.provider) {
        filter.provider = Some(provider);
    }
    if !config.region.is_empty() {
        filter = filter.with_region(config.region.clone());
    }
    filter
}

/// Build the configured provider from `provider`/`provider_config`. `local`
/// starts out empty — it exists for dry runs and demos that don't want real
/// cloud credentials, and is meant to be seeded programmatically rather than
/// from the CLI.
async fn build_provider(config: &DaemonConfig) -> Result<Option<Arc<dyn Provider>>> {
    let provider: Arc<dyn Provider> = match config.provider.as_str() {
        "local" => Arc::new(LocalProvider::new(Vec::new()).with_region(config.region.clone())),
        "aws" => Arc::new(AwsProvider::new(AwsProviderConfig {
            access_key_id: required(&config.provider_config, "access_key_id")?,
            secret_access_key: required(&config.provider_config, "secret_access_key")?,
            region: config.region.clone(),
            account_id: required(&config.provider_config, "account_id")?,
        })),
        "azure" => Arc::new(AzureProvider::new(AzureProviderConfig {
            tenant_id: required(&config.provider_config, "tenant_id")?,
            client_id: required(&config.provider_config, "client_id")?,
            client_secret: required(&config.provider_config, "client_secret")?,
            subscription_id: required(&config.provider_config, "subscription_id")?,
            region: config.region.clone(),
        })),
        "gcp" => {
            let gcp = GcpProvider::new(GcpProviderConfig {
                project_id: required(&config.provider_config, "project_id")?,
                region: config.region.clone(),
            })
            .await
            .context("failed to initialize GCP provider")?;
            Arc::new(gcp)
        }
        other => anyhow::bail!("unknown provider '{other}'; expected one of: local, aws, azure, gcp"),
    };
    Ok(Some(provider))
}

fn required(config: &HashMap<String, String>, key: &str) -> Result<String> {
    config
        .get(key)
        .cloned()
        .with_context(|| format!("provider_config is missing required key '{key}' for this provider"))
}
