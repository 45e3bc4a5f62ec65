//! Extractor trait definition

use std::sync::Arc;

use tower_lsp::lsp_types::{Range, Url};
use tracing::warn;

use crate::parser::document::TextDocument;
use crate::parser::types::{DependencyInfo, DocumentKind, NodeRef};

/// Parsed tree together with the text it was parsed from
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    text: Arc<str>,
}

impl SyntaxTree {
    pub fn new(tree: tree_sitter::Tree, text: Arc<str>) -> Self {
        Self { tree, text }
    }

    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }
}

/// Format-specific view of a manifest as a list of dependencies
///
/// Every operation degrades to an empty result on a tree it cannot
/// interpret; nothing here returns an error to the caller.
pub trait Extractor: Send + Sync {
    fn kind(&self) -> DocumentKind;

    /// Parse the document, reusing the previous tree while its content is unchanged
    fn parse(&self, document: &TextDocument) -> Option<Arc<SyntaxTree>>;

    /// Dependencies declared in the document, in source order
    fn dependencies_info(&self, tree: &SyntaxTree) -> Vec<DependencyInfo>;

    /// Dependency whose name or version scalar contains `offset`
    fn dependency_info_by_offset(&self, tree: &SyntaxTree, offset: usize)
    -> Option<DependencyInfo>;

    /// Drop the cached tree of a closed document
    fn invalidate(&self, uri: &Url);

    fn clear_cache(&self);

    /// Document range of a scalar, excluding surrounding quotes
    fn node_range(&self, document: &TextDocument, node: &NodeRef) -> Range {
        let (start, end) = node.content_span();
        document.range_at(start, end)
    }
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to parse the file structure
    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    /// Tree-sitter related error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

/// Run tree-sitter with `language` over `text`
pub fn parse_tree(
    language: &tree_sitter::Language,
    name: &str,
    text: &str,
) -> Result<tree_sitter::Tree, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(language).map_err(|e| {
        warn!("Failed to set {} language for tree-sitter: {}", name, e);
        ParseError::TreeSitter(e.to_string())
    })?;

    parser.parse(text, None).ok_or_else(|| {
        warn!("Failed to parse {} content", name);
        ParseError::ParseFailed(format!("Failed to parse {}", name))
    })
}

/// Walk from the smallest node at `offset` up to the closest ancestor of one of `kinds`
pub fn enclosing_node<'t>(
    tree: &'t SyntaxTree,
    offset: usize,
    kinds: &[&str],
) -> Option<tree_sitter::Node<'t>> {
    let mut node = tree.root().descendant_for_byte_range(offset, offset)?;
    loop {
        if kinds.contains(&node.kind()) {
            return Some(node);
        }
        node = node.parent()?;
    }
}
