//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use npmx_lsp::config::CacheConfig;
use npmx_lsp::version::error::RegistryError;
use npmx_lsp::version::registry::{Registry, ReplacementSource, VulnerabilitySource};
use npmx_lsp::version::store::PackageStore;
use npmx_lsp::version::types::{Advisory, ModuleReplacement, PackageInfo, VersionMeta};

/// In-memory npm registry
#[derive(Default)]
pub struct MockRegistry {
    packages: HashMap<String, PackageInfo>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package; `versions` pairs each version with its deprecation note
    pub fn with_package(
        mut self,
        name: &str,
        dist_tags: &[(&str, &str)],
        versions: &[(&str, Option<&str>)],
    ) -> Self {
        let info = PackageInfo::new(
            dist_tags
                .iter()
                .map(|(tag, version)| (tag.to_string(), version.to_string()))
                .collect(),
            versions
                .iter()
                .map(|(version, deprecated)| {
                    (
                        version.to_string(),
                        VersionMeta {
                            deprecated: deprecated.map(str::to_string),
                            provenance: false,
                        },
                    )
                })
                .collect::<IndexMap<_, _>>(),
        );
        self.packages.insert(name.to_string(), info);
        self
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_package_info(&self, package_name: &str) -> Result<PackageInfo, RegistryError> {
        self.packages
            .get(package_name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }
}

/// Replacement advisories keyed by package name
#[derive(Default)]
pub struct MockReplacements {
    replacements: HashMap<String, ModuleReplacement>,
}

impl MockReplacements {
    pub fn with_replacement(mut self, name: &str, replacement: ModuleReplacement) -> Self {
        self.replacements.insert(name.to_string(), replacement);
        self
    }
}

#[async_trait]
impl ReplacementSource for MockReplacements {
    async fn fetch_replacement(
        &self,
        package_name: &str,
    ) -> Result<Option<ModuleReplacement>, RegistryError> {
        Ok(self.replacements.get(package_name).cloned())
    }
}

/// Advisory ids keyed by `name@version`
#[derive(Default)]
pub struct MockVulnerabilities {
    advisories: HashMap<String, Vec<String>>,
}

impl MockVulnerabilities {
    pub fn with_advisories(mut self, name: &str, version: &str, ids: &[&str]) -> Self {
        self.advisories.insert(
            format!("{name}@{version}"),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl VulnerabilitySource for MockVulnerabilities {
    async fn fetch_advisories(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Vec<Advisory>, RegistryError> {
        Ok(self
            .advisories
            .get(&format!("{package_name}@{version}"))
            .map(|ids| {
                ids.iter()
                    .map(|id| Advisory {
                        id: id.clone(),
                        summary: None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Create a store over the given registry, without replacements or advisories
pub fn create_test_store(registry: MockRegistry) -> Arc<PackageStore> {
    create_test_store_with(
        registry,
        MockReplacements::default(),
        MockVulnerabilities::default(),
    )
}

pub fn create_test_store_with(
    registry: MockRegistry,
    replacements: MockReplacements,
    vulnerabilities: MockVulnerabilities,
) -> Arc<PackageStore> {
    Arc::new(PackageStore::new(
        Arc::new(registry),
        Arc::new(replacements),
        Arc::new(vulnerabilities),
        &CacheConfig::default(),
    ))
}
