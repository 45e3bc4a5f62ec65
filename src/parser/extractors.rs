//! Extractor selection by document kind

use tower_lsp::lsp_types::Url;

use crate::parser::package_json::PackageJsonExtractor;
use crate::parser::pnpm_workspace::PnpmWorkspaceExtractor;
use crate::parser::traits::Extractor;
use crate::parser::types::{DocumentKind, detect_document_kind};

/// One extractor instance per supported manifest format
#[derive(Default)]
pub struct Extractors {
    package_json: PackageJsonExtractor,
    pnpm_workspace: PnpmWorkspaceExtractor,
}

impl Extractors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DocumentKind) -> &dyn Extractor {
        match kind {
            DocumentKind::PackageJson => &self.package_json,
            DocumentKind::PnpmWorkspace => &self.pnpm_workspace,
        }
    }

    pub fn for_uri(&self, uri: &Url) -> Option<&dyn Extractor> {
        detect_document_kind(uri.path()).map(|kind| self.get(kind))
    }

    pub fn invalidate(&self, uri: &Url) {
        if let Some(extractor) = self.for_uri(uri) {
            extractor.invalidate(uri);
        }
    }

    pub fn clear_caches(&self) {
        self.package_json.clear_cache();
        self.pnpm_workspace.clear_cache();
    }
}
