//! Resolution of `catalog:` specifiers through the nearest pnpm-workspace.yaml

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tower_lsp::lsp_types::{Location, Url};
use tracing::{debug, warn};

use crate::config::PNPM_WORKSPACE_BASENAME;
use crate::parser::document::TextDocument;
use crate::parser::pnpm_workspace::{CatalogSource, DEFAULT_CATALOG_NAME, PnpmWorkspaceExtractor};
use crate::parser::types::CatalogResolution;
use crate::version::specifier::{Protocol, parse_version};
use crate::workspace::fs::{FileSystem, find_nearest_file};

const CATALOG_PREFIX: &str = "catalog:";

/// Specifier protocols a catalog entry may not use
const FORBIDDEN_ENTRY_PROTOCOLS: [&str; 4] = ["catalog:", "workspace:", "link:", "file:"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {0}")]
    InvalidYaml(Url),

    #[error("Invalid catalog configuration in {uri}: {reason}")]
    Misconfiguration { uri: Url, reason: String },
}

/// Catalogs of a workspace file with the location of every entry
#[derive(Debug, Default)]
pub struct CatalogManifest {
    catalogs: HashMap<String, HashMap<String, String>>,
    entry_locations: HashMap<(String, String), Location>,
}

impl CatalogManifest {
    /// Build the manifest from workspace text.
    pub fn parse(
        extractor: &PnpmWorkspaceExtractor,
        workspace_uri: &Url,
        text: &str,
    ) -> Result<Self, CatalogError> {
        let tree = extractor
            .parse_text(text)
            .filter(|tree| !tree.root().has_error())
            .ok_or_else(|| CatalogError::InvalidYaml(workspace_uri.clone()))?;

        let entries = extractor.catalog_entries(&tree);

        let declares_default = entries.iter().any(|e| e.source == CatalogSource::Default);
        let declares_named_default = entries
            .iter()
            .any(|e| e.source == CatalogSource::Named(DEFAULT_CATALOG_NAME.to_string()));
        if declares_default && declares_named_default {
            return Err(CatalogError::Misconfiguration {
                uri: workspace_uri.clone(),
                reason: "The 'default' catalog was defined multiple times. Use the 'catalog' field or 'catalogs.default', but not both.".to_string(),
            });
        }

        let document = TextDocument::new(workspace_uri.clone(), 0, text);
        let mut manifest = Self::default();

        for entry in entries {
            let catalog_name = entry.source.catalog_name().to_string();
            let (start, end) = entry.specifier_node.content_span();

            manifest.entry_locations.insert(
                (catalog_name.clone(), entry.alias.clone()),
                Location::new(workspace_uri.clone(), document.range_at(start, end)),
            );
            manifest
                .catalogs
                .entry(catalog_name)
                .or_default()
                .insert(entry.alias, entry.specifier);
        }

        Ok(manifest)
    }

    pub fn specifier(&self, catalog_name: &str, alias: &str) -> Option<&str> {
        self.catalogs.get(catalog_name)?.get(alias).map(String::as_str)
    }

    pub fn entry_location(&self, catalog_name: &str, alias: &str) -> Option<&Location> {
        self.entry_locations
            .get(&(catalog_name.to_string(), alias.to_string()))
    }
}

/// Catalog named by a `catalog:` specifier; the bare protocol means the default catalog
pub fn catalog_name_of(bare_specifier: &str) -> Option<&str> {
    let name = bare_specifier.trim().strip_prefix(CATALOG_PREFIX)?.trim();
    Some(if name.is_empty() {
        DEFAULT_CATALOG_NAME
    } else {
        name
    })
}

/// Outcome of a successful catalog lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDependencyResolution {
    pub resolved_specifier: String,
    pub catalog_name: String,
    pub workspace_uri: Url,
    pub entry_location: Location,
}

impl From<CatalogDependencyResolution> for CatalogResolution {
    fn from(resolution: CatalogDependencyResolution) -> Self {
        Self {
            catalog_name: resolution.catalog_name,
            workspace_uri: resolution.workspace_uri,
            entry_location: resolution.entry_location,
        }
    }
}

pub struct CatalogResolver {
    fs: Arc<dyn FileSystem>,
    extractor: PnpmWorkspaceExtractor,
}

impl CatalogResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            extractor: PnpmWorkspaceExtractor::new(),
        }
    }

    /// Nearest workspace file, searched from the document's parent directory
    pub async fn find_workspace_file(&self, document_uri: &Url) -> Option<PathBuf> {
        let path = document_uri.to_file_path().ok()?;
        let start = path.parent()?;
        find_nearest_file(self.fs.as_ref(), PNPM_WORKSPACE_BASENAME, start, |_| false).await
    }

    pub async fn load_manifest(
        &self,
        workspace_path: &Path,
        workspace_uri: &Url,
    ) -> Result<CatalogManifest, CatalogError> {
        let text = self
            .fs
            .read_to_string(workspace_path)
            .await
            .map_err(|source| CatalogError::Read {
                path: workspace_path.to_path_buf(),
                source,
            })?;

        CatalogManifest::parse(&self.extractor, workspace_uri, &text)
    }

    /// Follow `alias` with a `catalog:` specifier to the concrete specifier.
    ///
    /// Any miss, read failure or misconfiguration yields `None`; failures are logged.
    pub async fn resolve_catalog_dependency(
        &self,
        document_uri: &Url,
        alias: &str,
        bare_specifier: &str,
    ) -> Option<CatalogDependencyResolution> {
        let catalog_name = catalog_name_of(bare_specifier)?;

        let workspace_path = self.find_workspace_file(document_uri).await?;
        let workspace_uri = Url::from_file_path(&workspace_path).ok()?;

        let manifest = match self.load_manifest(&workspace_path, &workspace_uri).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        let Some(specifier) = manifest.specifier(catalog_name, alias) else {
            debug!(
                "No catalog entry '{}' was found for catalog '{}' in {}",
                alias, catalog_name, workspace_uri
            );
            return None;
        };

        if FORBIDDEN_ENTRY_PROTOCOLS
            .iter()
            .any(|protocol| specifier.starts_with(protocol))
        {
            warn!(
                "Invalid catalog configuration in {}: entry '{}' of catalog '{}' uses '{}'",
                workspace_uri, alias, catalog_name, specifier
            );
            return None;
        }

        let parsed = parse_version(specifier)?;
        if parsed.protocol == Some(Protocol::Catalog) {
            return None;
        }

        let entry_location = manifest.entry_location(catalog_name, alias)?.clone();

        Some(CatalogDependencyResolution {
            resolved_specifier: specifier.to_string(),
            catalog_name: catalog_name.to_string(),
            workspace_uri,
            entry_location,
        })
    }
}
