//! Attaches catalog resolution to extracted dependencies
//!
//! Every provider (diagnostics, hover, completion) evaluates the
//! *effective* specifier of a dependency: the written one, or the concrete
//! specifier behind a `catalog:` reference.

use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::parser::types::DependencyInfo;
use crate::version::specifier::{ParsedVersion, Protocol, parse_version};
use crate::workspace::catalog::CatalogResolver;
use crate::workspace::fs::FileSystem;

pub struct DependencyResolver {
    catalogs: CatalogResolver,
}

impl DependencyResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            catalogs: CatalogResolver::new(fs),
        }
    }

    /// Follow a `catalog:` specifier of `dependency`, declared in `document_uri`.
    ///
    /// Dependencies with any other specifier, and catalog references that do
    /// not resolve, are returned unchanged.
    pub async fn resolve(&self, document_uri: &Url, mut dependency: DependencyInfo) -> DependencyInfo {
        let is_catalog = parse_version(&dependency.version)
            .is_some_and(|parsed| parsed.protocol == Some(Protocol::Catalog));
        if !is_catalog {
            return dependency;
        }

        match self
            .catalogs
            .resolve_catalog_dependency(document_uri, &dependency.name, &dependency.version)
            .await
        {
            Some(resolution) => {
                debug!(
                    "Resolved {}@{} to {} via catalog '{}'",
                    dependency.name,
                    dependency.version,
                    resolution.resolved_specifier,
                    resolution.catalog_name
                );
                dependency.resolved_version = Some(resolution.resolved_specifier.clone());
                dependency.catalog_resolution = Some(resolution.into());
            }
            None => debug!(
                "Unresolved catalog reference {}@{} in {}",
                dependency.name, dependency.version, document_uri
            ),
        }

        dependency
    }
}

/// Parsed effective specifier of a (possibly resolved) dependency
pub fn effective_parsed(dependency: &DependencyInfo) -> Option<ParsedVersion> {
    parse_version(dependency.effective_version())
}

/// Registry-backed parsed specifier, or `None` for URL, `workspace:`, `jsr:`
/// and unresolved `catalog:` specifiers
pub fn supported_parsed(dependency: &DependencyInfo) -> Option<ParsedVersion> {
    effective_parsed(dependency).filter(ParsedVersion::is_supported)
}
