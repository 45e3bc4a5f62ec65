//! npmx replacement advisory API implementation

use std::time::Duration;

use tracing::warn;

use crate::config::{FETCH_TIMEOUT_MS, NPMX_DEV_API};
use crate::version::error::RegistryError;
use crate::version::registry::{ReplacementSource, encode_package_name};
use crate::version::types::ModuleReplacement;

/// Replacement advisories served by the npmx API (`GET {base}/replacements/{name}`)
pub struct NpmxReplacementSource {
    client: reqwest::Client,
    base_url: String,
}

impl NpmxReplacementSource {
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

impl Default for NpmxReplacementSource {
    fn default() -> Self {
        Self::new(NPMX_DEV_API)
    }
}

#[async_trait::async_trait]
impl ReplacementSource for NpmxReplacementSource {
    async fn fetch_replacement(
        &self,
        package_name: &str,
    ) -> Result<Option<ModuleReplacement>, RegistryError> {
        let url = format!(
            "{}/replacements/{}",
            self.base_url,
            encode_package_name(package_name)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            warn!("npmx API returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<ModuleReplacement>>(&body).map_err(|e| {
            warn!("Failed to parse replacement response for {}: {}", package_name, e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }
}
