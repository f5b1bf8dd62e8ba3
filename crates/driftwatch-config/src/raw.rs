use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw YAML representation of the daemon's config file, before conversion
/// and validation. Every field here is as forgiving as serde allows;
/// [`crate::loader::load_config`] is where defaults and required-key
/// validation actually happen.
#[derive(Debug, Deserialize, Serialize)]
pub struct RawConfig {
    pub version: String,
    pub provider: String,
    pub region: String,

    #[serde(default)]
    pub interval_seconds: Option<u64>,
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default)]
    pub storage_path: Option<String>,
    #[serde(default)]
    pub provider_config: HashMap<String, String>,
    #[serde(default)]
    pub policy: Option<RawPolicyConfig>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct RawPolicyConfig {
    pub stale_after_days: Option<u32>,
    pub tag_namespace: Option<String>,
}
