use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// The daemon's fully validated, typed configuration. Never deserialized
/// directly from YAML — always produced by [`crate::loader::load_config`]
/// from a [`crate::raw::RawConfig`] plus environment overrides.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub interval: Duration,
    pub metrics_port: u16,
    pub region: String,
    pub storage_path: PathBuf,
    pub provider: String,
    pub provider_config: HashMap<String, String>,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub stale_after_days: u32,
    pub tag_namespace: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { stale_after_days: 30, tag_namespace: "driftwatch".to_string() }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            metrics_port: 9090,
            region: String::new(),
            storage_path: PathBuf::from("./driftwatch-data"),
            provider: "local".to_string(),
            provider_config: HashMap::new(),
            policy: PolicyConfig::default(),
        }
    }
}
