//! npm registry API implementation

use std::collections::HashMap;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::config::{FETCH_TIMEOUT_MS, NPM_REGISTRY};
use crate::version::error::RegistryError;
use crate::version::registry::{Registry, encode_package_name};
use crate::version::types::{PackageInfo, VersionMeta};

/// Abbreviated metadata is much smaller than the full packument
const ABBREVIATED_ACCEPT: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*";

/// Response from npm registry API
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: IndexMap<String, NpmVersion>,
}

#[derive(Debug, Deserialize)]
struct NpmVersion {
    #[serde(default, deserialize_with = "deprecation_note")]
    deprecated: Option<String>,
    #[serde(default)]
    dist: Option<NpmDist>,
}

#[derive(Debug, Deserialize)]
struct NpmDist {
    #[serde(default)]
    attestations: Option<NpmAttestations>,
}

#[derive(Debug, Deserialize)]
struct NpmAttestations {
    #[serde(default)]
    provenance: Option<serde_json::Value>,
}

/// Some old packuments carry `"deprecated": false`; only a string is a note
fn deprecation_note<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(note)) => Some(note),
        _ => None,
    })
}

impl From<NpmVersion> for VersionMeta {
    fn from(version: NpmVersion) -> Self {
        let provenance = version
            .dist
            .and_then(|dist| dist.attestations)
            .and_then(|attestations| attestations.provenance)
            .is_some();

        Self {
            deprecated: version.deprecated,
            provenance,
        }
    }
}

/// Registry implementation for npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("npmx-lsp")
                .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(NPM_REGISTRY)
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    async fn fetch_package_info(&self, package_name: &str) -> Result<PackageInfo, RegistryError> {
        let url = format!("{}/{}", self.base_url, encode_package_name(package_name));

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, ABBREVIATED_ACCEPT)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let versions_meta = body
            .versions
            .into_iter()
            .map(|(version, meta)| (version, meta.into()))
            .collect();

        Ok(PackageInfo::new(body.dist_tags, versions_meta))
    }
}
