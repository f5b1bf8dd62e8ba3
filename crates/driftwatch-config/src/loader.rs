use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::{DaemonConfig, PolicyConfig};
use crate::error::ConfigError;
use crate::raw::RawConfig;

const ENV_PREFIX: &str = "DRIFTWATCH_";

/// Load a [`DaemonConfig`] from a YAML file at `path`, then apply
/// `DRIFTWATCH_*` environment variable overrides on top of it.
///
/// Required keys (`version`, `provider`, `region`) are validated here,
/// before the daemon starts — this is a config/compile-class error,
/// fatal at construction, never surfaced during a reconciliation tick.
pub fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = convert(raw, path)?;
    Ok(apply_env_overrides(config))
}

fn convert(raw: RawConfig, path: &Path) -> Result<DaemonConfig, ConfigError> {
    if raw.version.trim().is_empty() {
        return Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: "missing required key 'version'".to_string(),
        });
    }
    if raw.provider.trim().is_empty() {
        return Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: "missing required key 'provider'".to_string(),
        });
    }
    if raw.region.trim().is_empty() {
        return Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: "missing required key 'region'".to_string(),
        });
    }

    let defaults = DaemonConfig::default();
    let raw_policy = raw.policy.unwrap_or_default();

    Ok(DaemonConfig {
        interval: raw.interval_seconds.map(Duration::from_secs).unwrap_or(defaults.interval),
        metrics_port: raw.metrics_port.unwrap_or(defaults.metrics_port),
        region: raw.region,
        storage_path: raw.storage_path.map(Into::into).unwrap_or(defaults.storage_path),
        provider: raw.provider,
        provider_config: raw.provider_config,
        policy: PolicyConfig {
            stale_after_days: raw_policy.stale_after_days.unwrap_or(defaults.policy.stale_after_days),
            tag_namespace: raw_policy.tag_namespace.unwrap_or(defaults.policy.tag_namespace),
        },
    })
}

/// Overrides recognized: `DRIFTWATCH_INTERVAL_SECONDS`, `DRIFTWATCH_METRICS_PORT`,
/// `DRIFTWATCH_REGION`, `DRIFTWATCH_STORAGE_PATH`, `DRIFTWATCH_PROVIDER`.
fn apply_env_overrides(mut config: DaemonConfig) -> DaemonConfig {
    if let Ok(v) = std::env::var(format!("{ENV_PREFIX}INTERVAL_SECONDS")) {
        if let Ok(secs) = v.parse::<u64>() {
            debug!(secs, "config: DRIFTWATCH_INTERVAL_SECONDS override");
            config.interval = Duration::from_secs(secs);
        }
    }
    if let Ok(v) = std::env::var(format!("{ENV_PREFIX}METRICS_PORT")) {
        if let Ok(port) = v.parse::<u16>() {
            debug!(port, "config: DRIFTWATCH_METRICS_PORT override");
            config.metrics_port = port;
        }
    }
    if let Ok(v) = std::env::var(format!("{ENV_PREFIX}REGION")) {
        debug!(region = %v, "config: DRIFTWATCH_REGION override");
        config.region = v;
    }
    if let Ok(v) = std::env::var(format!("{ENV_PREFIX}STORAGE_PATH")) {
        debug!(path = %v, "config: DRIFTWATCH_STORAGE_PATH override");
        config.storage_path = v.into();
    }
    if let Ok(v) = std::env::var(format!("{ENV_PREFIX}PROVIDER")) {
        debug!(provider = %v, "config: DRIFTWATCH_PROVIDER override");
        config.provider = v;
    }
    config
}
