//! pnpm-workspace.yaml catalog extractor
//!
//! Supports two formats, in block or flow style:
//! 1. Default catalog: `catalog:` with direct package entries
//! 2. Named catalogs: `catalogs:` with nested catalog groups

use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tree_sitter::Node;

use crate::parser::cache::ParseCache;
use crate::parser::document::TextDocument;
use crate::parser::traits::{Extractor, SyntaxTree, enclosing_node, parse_tree};
use crate::parser::types::{DependencyInfo, DocumentKind, NodeRef};

pub const DEFAULT_CATALOG_NAME: &str = "default";

const CATALOG_SECTION: &str = "catalog";
const CATALOGS_SECTION: &str = "catalogs";

const PAIR_KINDS: [&str; 2] = ["block_mapping_pair", "flow_pair"];

/// Which mapping declared a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Top-level `catalog:`
    Default,
    /// `catalogs.<name>`
    Named(String),
}

impl CatalogSource {
    pub fn catalog_name(&self) -> &str {
        match self {
            CatalogSource::Default => DEFAULT_CATALOG_NAME,
            CatalogSource::Named(name) => name,
        }
    }
}

/// One `alias: specifier` leaf of a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub source: CatalogSource,
    pub alias: String,
    pub specifier: String,
    pub alias_node: NodeRef,
    pub specifier_node: NodeRef,
}

impl From<CatalogEntry> for DependencyInfo {
    fn from(entry: CatalogEntry) -> Self {
        DependencyInfo::new(
            entry.alias,
            entry.specifier,
            entry.alias_node,
            entry.specifier_node,
        )
    }
}

/// Extractor for pnpm-workspace.yaml catalog files
#[derive(Default)]
pub struct PnpmWorkspaceExtractor {
    cache: ParseCache,
}

impl PnpmWorkspaceExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse workspace text outside of the open-document cache
    pub fn parse_text(&self, text: &str) -> Option<SyntaxTree> {
        parse_tree(&tree_sitter_yaml::LANGUAGE.into(), "YAML", text)
            .ok()
            .map(|tree| SyntaxTree::new(tree, Arc::from(text)))
    }

    /// Every catalog entry of the document, in source order
    pub fn catalog_entries(&self, tree: &SyntaxTree) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();

        for section_pair in Self::root_pairs(tree) {
            let Some(section) = Self::mapping_value(section_pair) else {
                continue;
            };

            match Self::key_text(tree, section_pair).as_deref() {
                Some(CATALOG_SECTION) => {
                    entries.extend(
                        Self::pairs(section).filter_map(|pair| Self::recognize_entry(tree, pair)),
                    );
                }
                Some(CATALOGS_SECTION) => {
                    for catalog_pair in Self::pairs(section) {
                        let Some(catalog) = Self::mapping_value(catalog_pair) else {
                            continue;
                        };
                        entries.extend(
                            Self::pairs(catalog)
                                .filter_map(|pair| Self::recognize_entry(tree, pair)),
                        );
                    }
                }
                _ => {}
            }
        }

        entries
    }

    /// Catalog entry declared by `pair`, provided it is a scalar leaf of
    /// the root `catalog` mapping or of a `catalogs.<name>` mapping
    fn recognize_entry(tree: &SyntaxTree, pair: Node<'_>) -> Option<CatalogEntry> {
        if !PAIR_KINDS.contains(&pair.kind()) {
            return None;
        }

        let section_pair = Self::owning_pair(pair)?;
        let section_key = Self::key_text(tree, section_pair)?;

        let source = if Self::is_root_pair(section_pair) {
            (section_key == CATALOG_SECTION).then_some(CatalogSource::Default)?
        } else {
            let catalogs_pair = Self::owning_pair(section_pair)?;
            let is_catalogs = Self::is_root_pair(catalogs_pair)
                && Self::key_text(tree, catalogs_pair).as_deref() == Some(CATALOGS_SECTION);
            is_catalogs.then_some(CatalogSource::Named(section_key))?
        };

        let (alias, alias_node) = Self::scalar(tree, pair.child_by_field_name("key")?)?;
        let (specifier, specifier_node) = Self::scalar(tree, pair.child_by_field_name("value")?)?;

        Some(CatalogEntry {
            source,
            alias,
            specifier,
            alias_node,
            specifier_node,
        })
    }

    /// Pair whose value is the mapping that contains `pair`
    fn owning_pair(pair: Node<'_>) -> Option<Node<'_>> {
        let mapping = pair.parent()?;
        let holder = mapping.parent()?;
        let owner = holder.parent().filter(|n| PAIR_KINDS.contains(&n.kind()))?;
        (owner.child_by_field_name("value")?.id() == holder.id()).then_some(owner)
    }

    fn is_root_pair(pair: Node<'_>) -> bool {
        pair.parent()
            .and_then(|mapping| mapping.parent())
            .and_then(|holder| holder.parent())
            .is_some_and(|document| document.kind() == "document")
    }

    fn root_pairs(tree: &SyntaxTree) -> Vec<Node<'_>> {
        let root = tree.root();
        let mut cursor = root.walk();
        let Some(document) = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "document")
        else {
            return Vec::new();
        };

        let mut cursor = document.walk();
        let Some(body) = document
            .named_children(&mut cursor)
            .find(|n| matches!(n.kind(), "block_node" | "flow_node"))
        else {
            return Vec::new();
        };

        Self::mapping_in(body).map(Self::pairs).into_iter().flatten().collect()
    }

    /// `block_mapping`/`flow_mapping` directly under a value node
    fn mapping_in(node: Node<'_>) -> Option<Node<'_>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .find(|n| matches!(n.kind(), "block_mapping" | "flow_mapping"))
    }

    fn mapping_value(pair: Node<'_>) -> Option<Node<'_>> {
        Self::mapping_in(pair.child_by_field_name("value")?)
    }

    fn pairs(mapping: Node<'_>) -> impl Iterator<Item = Node<'_>> {
        let mut cursor = mapping.walk();
        mapping
            .named_children(&mut cursor)
            .filter(|n| PAIR_KINDS.contains(&n.kind()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn key_text(tree: &SyntaxTree, pair: Node<'_>) -> Option<String> {
        Self::scalar(tree, pair.child_by_field_name("key")?).map(|(text, _)| text)
    }

    /// Value and span of a plain or quoted scalar; `None` for anything else
    fn scalar(tree: &SyntaxTree, node: Node<'_>) -> Option<(String, NodeRef)> {
        if node.kind() != "flow_node" {
            return None;
        }

        let mut cursor = node.walk();
        let scalar = node.named_children(&mut cursor).find(|n| {
            matches!(
                n.kind(),
                "plain_scalar" | "double_quote_scalar" | "single_quote_scalar"
            )
        })?;

        let raw = tree.node_text(scalar);
        let (start, end) = (scalar.start_byte(), scalar.end_byte());

        match scalar.kind() {
            "plain_scalar" => Some((raw.trim().to_string(), NodeRef::new(start, end, false))),
            "double_quote_scalar" => {
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                let value = serde_json::from_str(raw).unwrap_or_else(|_| inner.to_string());
                Some((value, NodeRef::new(start, end, true)))
            }
            _ => {
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                Some((inner.replace("''", "'"), NodeRef::new(start, end, true)))
            }
        }
    }
}

impl Extractor for PnpmWorkspaceExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PnpmWorkspace
    }

    fn parse(&self, document: &TextDocument) -> Option<Arc<SyntaxTree>> {
        self.cache.get_or_parse(document, |text| {
            parse_tree(&tree_sitter_yaml::LANGUAGE.into(), "YAML", text)
        })
    }

    fn dependencies_info(&self, tree: &SyntaxTree) -> Vec<DependencyInfo> {
        self.catalog_entries(tree)
            .into_iter()
            .map(DependencyInfo::from)
            .collect()
    }

    fn dependency_info_by_offset(
        &self,
        tree: &SyntaxTree,
        offset: usize,
    ) -> Option<DependencyInfo> {
        let pair = enclosing_node(tree, offset, &PAIR_KINDS)?;
        let entry = Self::recognize_entry(tree, pair)?;

        (entry.alias_node.contains(offset) || entry.specifier_node.contains(offset))
            .then(|| entry.into())
    }

    fn invalidate(&self, uri: &Url) {
        self.cache.invalidate(uri);
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}
