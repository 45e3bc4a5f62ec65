//! Parser layer
//! - document.rs: open document text with offset/position conversion
//! - traits.rs: Extractor trait and tree-sitter helpers
//! - types.rs: DependencyInfo, NodeRef, DocumentKind
//! - cache.rs: parse cache keyed by content fingerprint
//! - package_json.rs: package.json extractor
//! - pnpm_workspace.rs: pnpm-workspace.yaml catalog extractor
//! - extractors.rs: extractor selection by document kind

pub mod cache;
pub mod document;
pub mod extractors;
pub mod package_json;
pub mod pnpm_workspace;
pub mod traits;
pub mod types;

pub use document::TextDocument;
pub use extractors::Extractors;
pub use package_json::PackageJsonExtractor;
pub use pnpm_workspace::PnpmWorkspaceExtractor;
pub use traits::{Extractor, ParseError, SyntaxTree};
pub use types::{CatalogResolution, DependencyInfo, DocumentKind, NodeRef};
