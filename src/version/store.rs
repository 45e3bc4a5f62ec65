//! Process-wide memoized access to package, replacement and vulnerability data

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{CacheConfig, RegistryConfig};
use crate::version::error::RegistryError;
use crate::version::memoize::Memoized;
use crate::version::registries::{NpmRegistry, NpmxReplacementSource, OsvClient};
use crate::version::registry::{Registry, ReplacementSource, VulnerabilitySource};
use crate::version::types::{Advisory, ModuleReplacement, PackageInfo};

pub struct PackageStore {
    registry: Arc<dyn Registry>,
    replacement_source: Arc<dyn ReplacementSource>,
    vulnerability_source: Arc<dyn VulnerabilitySource>,
    packages: Memoized<Arc<PackageInfo>>,
    replacements: Memoized<ModuleReplacement>,
    advisories: Memoized<Arc<Vec<Advisory>>>,
}

impl PackageStore {
    pub fn new(
        registry: Arc<dyn Registry>,
        replacement_source: Arc<dyn ReplacementSource>,
        vulnerability_source: Arc<dyn VulnerabilitySource>,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            registry,
            replacement_source,
            vulnerability_source,
            packages: Memoized::new(cache.ttl(), cache.max_size),
            replacements: Memoized::new(cache.ttl(), cache.max_size),
            advisories: Memoized::new(cache.ttl(), cache.max_size),
        }
    }

    /// Store backed by the HTTP clients for the configured endpoints
    pub fn with_endpoints(registry: &RegistryConfig, cache: &CacheConfig) -> Self {
        Self::new(
            Arc::new(NpmRegistry::new(&registry.npm)),
            Arc::new(NpmxReplacementSource::new(&registry.npmx)),
            Arc::new(OsvClient::new(&registry.osv)),
            cache,
        )
    }

    /// Registry snapshot for `name`; `None` when unknown or unavailable
    pub async fn package_info(&self, name: &str) -> Option<Arc<PackageInfo>> {
        let registry = Arc::clone(&self.registry);
        let name_owned = name.to_string();

        self.packages
            .get_with(name, move || async move {
                info!("Fetching package info for {}", name_owned);
                match registry.fetch_package_info(&name_owned).await {
                    Ok(package) => {
                        info!("Fetched package info for {}", name_owned);
                        Ok(Some(Arc::new(package)))
                    }
                    Err(RegistryError::NotFound(_)) => {
                        warn!("Package {} not found in registry", name_owned);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }

    pub async fn replacement(&self, name: &str) -> Option<ModuleReplacement> {
        let source = Arc::clone(&self.replacement_source);
        let name_owned = name.to_string();

        self.replacements
            .get_with(name, move || async move {
                info!("Fetching replacements for {}", name_owned);
                source.fetch_replacement(&name_owned).await
            })
            .await
    }

    /// Known advisories for an exact version, memoized by `name@version`
    pub async fn advisories(&self, name: &str, version: &str) -> Option<Arc<Vec<Advisory>>> {
        let source = Arc::clone(&self.vulnerability_source);
        let name_owned = name.to_string();
        let version_owned = version.to_string();

        self.advisories
            .get_with(&format!("{name}@{version}"), move || async move {
                info!("Fetching advisories for {}@{}", name_owned, version_owned);
                let advisories = source.fetch_advisories(&name_owned, &version_owned).await?;
                Ok::<_, RegistryError>(Some(Arc::new(advisories)))
            })
            .await
    }

    pub fn configure(&self, cache: &CacheConfig) {
        self.packages.configure(cache.ttl(), cache.max_size);
        self.replacements.configure(cache.ttl(), cache.max_size);
        self.advisories.configure(cache.ttl(), cache.max_size);
    }

    pub fn clear(&self) {
        self.packages.clear();
        self.replacements.clear();
        self.advisories.clear();
        info!("Cleared package, replacement and advisory caches");
    }
}
