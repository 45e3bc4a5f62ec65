//! Common types for extractors

use tower_lsp::lsp_types::{Location, Url};

use crate::config::{PACKAGE_JSON_BASENAME, PNPM_WORKSPACE_BASENAME};

/// Manifest formats with a dedicated extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// package.json dependency sections
    PackageJson,
    /// pnpm-workspace.yaml catalogs
    PnpmWorkspace,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::PackageJson => "package_json",
            DocumentKind::PnpmWorkspace => "pnpm_workspace",
        }
    }
}

/// Detect the document kind from the file name at the end of the URI
pub fn detect_document_kind(uri: &str) -> Option<DocumentKind> {
    let file_name = uri.rsplit(['/', '\\']).next()?;
    match file_name {
        PACKAGE_JSON_BASENAME => Some(DocumentKind::PackageJson),
        PNPM_WORKSPACE_BASENAME => Some(DocumentKind::PnpmWorkspace),
        _ => None,
    }
}

/// Byte span of a scalar in the parsed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub start: usize,
    pub end: usize,
    /// Whether the span includes surrounding quote characters
    pub quoted: bool,
}

impl NodeRef {
    pub fn new(start: usize, end: usize, quoted: bool) -> Self {
        Self { start, end, quoted }
    }

    /// Span of the scalar content, without quotes
    pub fn content_span(&self) -> (usize, usize) {
        if self.quoted && self.end >= self.start + 2 {
            (self.start + 1, self.end - 1)
        } else {
            (self.start, self.end)
        }
    }

    /// `start <= offset <= end`; the end is inclusive so a cursor right
    /// behind an unquoted scalar still hits it
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Where a catalog-indirected specifier was resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogResolution {
    pub catalog_name: String,
    pub workspace_uri: Url,
    /// Range of the specifier value inside the workspace file
    pub entry_location: Location,
}

/// One declared dependency occurrence in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    /// Package alias as written
    pub name: String,
    /// Raw specifier as written
    pub version: String,
    pub name_node: NodeRef,
    pub version_node: NodeRef,
    /// Concrete specifier behind a `catalog:` indirection
    pub resolved_version: Option<String>,
    pub catalog_resolution: Option<CatalogResolution>,
}

impl DependencyInfo {
    pub fn new(name: String, version: String, name_node: NodeRef, version_node: NodeRef) -> Self {
        Self {
            name,
            version,
            name_node,
            version_node,
            resolved_version: None,
            catalog_resolution: None,
        }
    }

    /// Specifier the version-dependent rules evaluate
    pub fn effective_version(&self) -> &str {
        self.resolved_version.as_deref().unwrap_or(&self.version)
    }
}
