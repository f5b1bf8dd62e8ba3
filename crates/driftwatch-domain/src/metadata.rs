use serde::{Deserialize, Serialize};

/// Closed record of optional, provider-agnostic resource metadata.
///
/// Deliberately NOT a free-form `map<string, any>` — every field is named so
/// diffing and querying stay well-defined across providers. A provider that
/// wants to carry extra raw fields does so at the emitter boundary, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    // ── compute ──────────────────────────────────────────────────────────────
    pub instance_type: Option<String>,
    pub vcpus: Option<u32>,
    pub memory_mb: Option<u64>,

    // ── storage ──────────────────────────────────────────────────────────────
    pub size_gb: Option<u64>,
    pub volume_type: Option<String>,
    pub encrypted: Option<bool>,

    // ── network ──────────────────────────────────────────────────────────────
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,

    // ── identity ─────────────────────────────────────────────────────────────
    pub iam_role: Option<String>,
    #[serde(default)]
    pub attached_policies: Vec<String>,

    // ── operational hints ────────────────────────────────────────────────────
    pub availability_zone: Option<String>,
    pub launch_template: Option<String>,
    pub auto_scaling_group: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self == &Metadata::default()
    }
}
