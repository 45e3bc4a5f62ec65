//! Version completion inside a dependency specifier

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Position, TextEdit,
};

use crate::config::{CompletionConfig, CompletionMode};
use crate::lsp::resolver::supported_parsed;
use crate::parser::document::TextDocument;
use crate::parser::traits::Extractor;
use crate::version::store::PackageStore;

fn is_prerelease(version: &str) -> bool {
    version.contains('-')
}

/// One item per published, non-deprecated version of the dependency under
/// the cursor. Items keep the protocol and range prefix already written.
pub async fn completion_items(
    document: &TextDocument,
    position: Position,
    extractor: &dyn Extractor,
    store: &PackageStore,
    config: &CompletionConfig,
) -> Option<Vec<CompletionItem>> {
    if config.version == CompletionMode::Off {
        return None;
    }

    let tree = extractor.parse(document)?;
    let offset = document.offset_at(position);
    let dependency = extractor.dependency_info_by_offset(&tree, offset)?;
    if !dependency.version_node.contains(offset) {
        return None;
    }

    let parsed = supported_parsed(&dependency)?;
    let package = store.package_info(&dependency.name).await?;
    let range = extractor.node_range(document, &dependency.version_node);
    let total = package.versions_meta.len();

    let items = package
        .versions_meta
        .iter()
        .enumerate()
        .filter(|(_, (version, meta))| {
            meta.deprecated.is_none()
                && !(config.exclude_prerelease && is_prerelease(version))
                && (config.version != CompletionMode::ProvenanceOnly || meta.provenance)
        })
        .map(|(index, (version, _))| {
            let text = parsed.with_semver(version.as_str()).to_string();
            CompletionItem {
                label: text.clone(),
                kind: Some(CompletionItemKind::VALUE),
                detail: package.version_to_tag.get(version).cloned(),
                // newest first
                sort_text: Some(format!("{:06}", total - index)),
                filter_text: Some(text.clone()),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range,
                    new_text: text,
                })),
                ..Default::default()
            }
        })
        .collect();

    Some(items)
}
