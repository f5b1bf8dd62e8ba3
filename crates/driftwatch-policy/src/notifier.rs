use async_trait::async_trait;
use driftwatch_domain::Resource;
use tracing::info;

use crate::result::PolicyResult;

/// The outbound side of a `notify` enforcement action. A real deployment
/// would plug in Slack/PagerDuty/email here; the core ships only a
/// logging implementation.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, resource: &Resource, result: &PolicyResult);
}

/// Logs the notification at `info` level and does nothing else. The
/// reference implementation used whenever no real notifier is configured.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, resource: &Resource, result: &PolicyResult) {
        info!(
            resource_id = %resource.id,
            decision = %result.decision,
            reason = %result.reason,
            "policy notification"
        );
    }
}
