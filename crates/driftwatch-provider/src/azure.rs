use async_trait::async_trait;
use driftwatch_domain::{CloudProvider, Resource, ResourceFilter, ResourceId, ResourceType, Tags};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::Provider;

/// Static configuration for the Azure provider, injected at startup.
#[derive(Clone)]
pub struct AzureProviderConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub region: String,
}

/// Scaffold for an Azure Resource Graph-backed provider: OAuth2 client-credential
/// token acquisition plus one query endpoint, mirroring the shape a full
/// implementation would take without covering every resource provider.
pub struct AzureProvider {
    config: AzureProviderConfig,
    client: reqwest::Client,
    cached_token: Mutex<Option<String>>,
}

impl AzureProvider {
    pub fn new(config: AzureProviderConfig) -> Self {
        Self { config, client: reqwest::Client::new(), cached_token: Mutex::new(None) }
    }

    async fn token(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached_token.lock().await;
        if let Some(t) = cached.as_ref() {
            return Ok(t.clone());
        }

        let url = format!("https://login.microsoftonline.com/{}/oauth2/v2.0/token", self.config.tenant_id);
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", "https://management.azure.com/.default"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::AuthFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::AuthFailed(format!("token endpoint returned {}", resp.status())));
        }

        let body: Value = resp.json().await.map_err(|e| ProviderError::AuthFailed(e.to_string()))?;
        let token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::AuthFailed("token response missing access_token".into()))?
            .to_string();

        *cached = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl Provider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn region(&self) -> &str {
        &self.config.region
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ProviderError> {
        let token = self.token().await?;

        let url = "https://management.azure.com/providers/Microsoft.ResourceGraph/resources?api-version=2021-03-01";
        let query = serde_json::json!({
            "subscriptions": [self.config.subscription_id],
            "query": "Resources | project id, type, tags, location",
        });

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&query)
            .send()
            .await
            .map_err(|e| ProviderError::ListFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::ListFailed(format!("resource graph query returned {}", resp.status())));
        }

        let body: Value = resp.json().await.map_err(|e| ProviderError::ListFailed(e.to_string()))?;
        let rows = body.get("data").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut resources = Vec::with_capacity(rows.len());
        for row in rows {
            match resource_from_row(&row) {
                Some(r) if r.matches(filter) => resources.push(r),
                Some(_) => {}
                None => warn!("AzureProvider: skipping malformed resource graph row"),
            }
        }
        Ok(resources)
    }

    async fn tag_resource(&self, id: &ResourceId, key: &str, value: &str) -> Result<(), ProviderError> {
        debug!(%id, key, value, "AzureProvider: tag_resource (ARM PATCH call omitted from scaffold)");
        Err(ProviderError::UnsupportedAction("tag_resource"))
    }
}

fn resource_from_row(row: &Value) -> Option<Resource> {
    let id = row.get("id")?.as_str()?;
    let resource_type = row.get("type").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
    let region = row.get("location").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();

    let mut map = std::collections::HashMap::new();
    if let Some(obj) = row.get("tags").and_then(|v| v.as_object()) {
        for (k, v) in obj {
            if let Some(s) = v.as_str() {
                map.insert(k.clone(), s.to_string());
            }
        }
    }

    let account_id = id.split('/').nth(2).unwrap_or("unknown").to_string();

    Some(Resource {
        provider: CloudProvider::Azure,
        account_id,
        region,
        resource_type: ResourceType::new(resource_type),
        id: ResourceId::new(id),
        name: None,
        status: None,
        created_at: None,
        last_seen_at: Some(chrono::Utc::now()),
        tags: Tags::from_map(&map),
        metadata: Default::default(),
    })
}
