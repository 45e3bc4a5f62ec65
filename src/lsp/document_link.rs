use tower_lsp::lsp_types::{DocumentLink, Url};

use crate::links::npmx_package_url;
use crate::parser::document::TextDocument;
use crate::parser::traits::Extractor;

/// Link every dependency name to its package page
pub fn document_links(document: &TextDocument, extractor: &dyn Extractor) -> Vec<DocumentLink> {
    let Some(tree) = extractor.parse(document) else {
        return Vec::new();
    };

    extractor
        .dependencies_info(&tree)
        .into_iter()
        .filter_map(|dependency| {
            let target = Url::parse(&npmx_package_url(&dependency.name, None)).ok()?;
            Some(DocumentLink {
                range: extractor.node_range(document, &dependency.name_node),
                target: Some(target),
                tooltip: None,
                data: None,
            })
        })
        .collect()
}
