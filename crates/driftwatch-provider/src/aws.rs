use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use driftwatch_domain::{CloudProvider, Resource, ResourceFilter, ResourceId, ResourceType, Tags};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::Provider;

type HmacSha256 = Hmac<Sha256>;

/// Static configuration for the AWS provider, injected at startup.
#[derive(Clone)]
pub struct AwsProviderConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub account_id: String,
}

/// Talks to the AWS Resource Groups Tagging API to enumerate resources.
///
/// This is a scaffold, not a full SDK replacement: it covers SigV4 request
/// signing and response mapping for one endpoint, enough to demonstrate how a
/// production implementation would plug into [`Provider`]. Per-service
/// coverage (EC2 describe-instances, S3 list-buckets, etc.) is left for a
/// real driver.
pub struct AwsProvider {
    config: AwsProviderConfig,
    client: reqwest::Client,
    base_url: String,
}

impl AwsProvider {
    pub fn new(config: AwsProviderConfig) -> Self {
        let base_url = format!("https://tagging.{}.amazonaws.com", config.region);
        Self { config, client: reqwest::Client::new(), base_url }
    }

    fn sign(&self, string_to_sign: &str, date: &str) -> String {
        let k_date = hmac_sha256(format!("AWS4{}", self.config.secret_access_key).as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.config.region.as_bytes());
        let k_service = hmac_sha256(&k_region, b"tagging");
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        hex(&hmac_sha256(&k_signing, string_to_sign.as_bytes()))
    }

    fn request_timestamp(&self) -> (String, String) {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let date = chrono::DateTime::from_timestamp(now.as_secs() as i64, 0).unwrap_or_default();
        (date.format("%Y%m%dT%H%M%SZ").to_string(), date.format("%Y%m%d").to_string())
    }
}

#[async_trait]
impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn region(&self) -> &str {
        &self.config.region
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ProviderError> {
        let (amz_date, date_stamp) = self.request_timestamp();
        let payload = serde_json::json!({}).to_string();
        let payload_hash = hex(&Sha256::digest(payload.as_bytes()));

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}/{}/tagging/aws4_request\n{}",
            amz_date, date_stamp, self.config.region, payload_hash
        );
        let signature = self.sign(&string_to_sign, &date_stamp);
        debug!(signature_len = signature.len(), "AwsProvider: signed GetResources request");

        let resp = self
            .client
            .post(format!("{}/", self.base_url))
            .header("X-Amz-Target", "ResourceGroupsTaggingAPI_20170126.GetResources")
            .header("X-Amz-Date", &amz_date)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("Authorization", format!("AWS4-HMAC-SHA256 Credential={}/{}/{}/tagging/aws4_request, SignedHeaders=host;x-amz-date, Signature={}", self.config.access_key_id, date_stamp, self.config.region, signature))
            .body(payload)
            .send()
            .await
            .map_err(|e| ProviderError::ListFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::ListFailed(format!("GetResources returned {}", resp.status())));
        }

        let body: Value = resp.json().await.map_err(|e| ProviderError::ListFailed(e.to_string()))?;
        let entries = body
            .get("ResourceTagMappingList")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut resources = Vec::with_capacity(entries.len());
        for entry in entries {
            match resource_from_tagging_entry(&entry, &self.config) {
                Some(r) if r.matches(filter) => resources.push(r),
                Some(_) => {}
                None => warn!("AwsProvider: skipping malformed tagging entry"),
            }
        }
        Ok(resources)
    }

    async fn tag_resource(&self, id: &ResourceId, key: &str, value: &str) -> Result<(), ProviderError> {
        debug!(%id, key, value, "AwsProvider: tag_resource (TagResources API call omitted from scaffold)");
        Err(ProviderError::UnsupportedAction("tag_resource"))
    }
}

fn resource_from_tagging_entry(entry: &Value, config: &AwsProviderConfig) -> Option<Resource> {
    let arn = entry.get("ResourceARN")?.as_str()?;
    let resource_type = arn.split(':').nth(2).unwrap_or("unknown").to_string();

    let mut map = std::collections::HashMap::new();
    if let Some(tags) = entry.get("Tags").and_then(|v| v.as_array()) {
        for tag in tags {
            if let (Some(k), Some(v)) = (tag.get("Key").and_then(|v| v.as_str()), tag.get("Value").and_then(|v| v.as_str())) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }

    Some(Resource {
        provider: CloudProvider::Aws,
        account_id: config.account_id.clone(),
        region: config.region.clone(),
        resource_type: ResourceType::new(resource_type),
        id: ResourceId::new(arn),
        name: None,
        status: None,
        created_at: None,
        last_seen_at: Some(chrono::Utc::now()),
        tags: Tags::from_map(&map),
        metadata: Default::default(),
    })
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
