use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use driftwatch_config::DaemonConfig;
use driftwatch_domain::{CloudProvider, ResourceFilter};
use driftwatch_policy::{Enforcer, Notifier, PolicySet};
use driftwatch_provider::Provider;
use driftwatch_store::Store;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::DaemonError;
use crate::reconciler;
use crate::server::{self, ServerState};

/// Budget for in-flight work to wind down once cancellation is requested:
/// the current tick finishing, and the enforcer's spawned persistence
/// tasks draining, before the store handle is dropped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Owns the two cooperating long-lived tasks (reconciliation loop, metrics
/// server) for one daemon instance, plus the shared cancellation token that
/// supervises them.
pub struct Daemon {
    config: DaemonConfig,
    store: Arc<dyn Store>,
    provider: Option<Arc<dyn Provider>>,
    policy_set: Arc<PolicySet>,
    notifier: Arc<dyn Notifier>,
    token: CancellationToken,
}

impl Daemon {
    pub fn new(
        config: DaemonConfig,
        store: Arc<dyn Store>,
        provider: Option<Arc<dyn Provider>>,
        policy_set: Arc<PolicySet>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { config, store, provider, policy_set, notifier, token: CancellationToken::new() }
    }

    /// A token callers can use to request shutdown (e.g. from a Ctrl-C
    /// handler) without needing a handle to the running tasks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs both supervised tasks until one exits, then signals the other
    /// to stop and returns the first non-nil error (`Ok(())` on a clean,
    /// cancellation-driven shutdown).
    pub async fn start(self) -> Result<(), DaemonError> {
        let metrics_handle = crate::metrics::install();
        let ready = Arc::new(AtomicBool::new(self.provider.is_none()));

        let server_state = ServerState { started_at: Instant::now(), ready: ready.clone(), metrics_handle };

        let enforcer = Arc::new(Enforcer::new(
            self.provider.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.config.policy.tag_namespace.clone(),
        ));

        let cloud_label = self.config.provider.clone();
        let region_label = self.config.region.clone();
        let filter = provider_filter(&self.config);

        let token = self.token.clone();
        let server_token = token.clone();
        let port = self.config.metrics_port;

        let mut server_task =
            tokio::spawn(async move { server::serve(port, server_state, server_token).await });

        let loop_token = token.clone();
        let mut loop_task = tokio::spawn(reconciler::run_loop(
            self.provider,
            self.store,
            self.policy_set,
            enforcer,
            filter,
            self.config.interval,
            cloud_label,
            region_label,
            ready,
            loop_token,
        ));

        let outcome = tokio::select! {
            res = &mut server_task => {
                token.cancel();
                res.map_err(DaemonError::from).and_then(|r| r)
            }
            res = &mut loop_task => {
                token.cancel();
                res.map_err(DaemonError::from).and_then(|r| r)
            }
        };

        // Give the task we didn't see finish first a bounded grace period
        // before moving on — it should already be unwinding from the same
        // cancellation token.
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, server_task).await;
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, loop_task).await;

        if let Err(e) = &outcome {
            error!(error = %e, "daemon shutting down due to supervised task failure");
        } else {
            info!("daemon shut down cleanly");
        }

        outcome
    }
}

fn provider_filter(config: &DaemonConfig) -> ResourceFilter {
    let mut filter = ResourceFilter::default();
    if let Ok(provider) = CloudProvider::from_str(&config.provider) {
        filter.provider = Some(provider);
    }
    if !config.region.is_empty() {
        filter = filter.with_region(config.region.clone());
    }
    filter
}
