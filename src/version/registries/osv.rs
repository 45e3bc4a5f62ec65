//! OSV vulnerability database implementation

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{FETCH_TIMEOUT_MS, OSV_API};
use crate::version::error::RegistryError;
use crate::version::registry::VulnerabilitySource;
use crate::version::types::Advisory;

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackage<'a>,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'static str,
}

/// Response from `POST /v1/query`; an empty object when nothing matches
#[derive(Debug, Deserialize)]
struct OsvQueryResponse {
    #[serde(default)]
    vulns: Vec<Advisory>,
}

pub struct OsvClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsvClient {
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

impl Default for OsvClient {
    fn default() -> Self {
        Self::new(OSV_API)
    }
}

#[async_trait::async_trait]
impl VulnerabilitySource for OsvClient {
    async fn fetch_advisories(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Vec<Advisory>, RegistryError> {
        let url = format!("{}/v1/query", self.base_url);
        let query = OsvQuery {
            package: OsvPackage {
                name: package_name,
                ecosystem: "npm",
            },
            version,
        };

        let response = self.client.post(&url).json(&query).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("OSV API returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body: OsvQueryResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse OSV response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(body.vulns)
    }
}
