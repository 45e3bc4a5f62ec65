//! package.json extractor

use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tree_sitter::Node;

use crate::parser::cache::ParseCache;
use crate::parser::document::TextDocument;
use crate::parser::traits::{Extractor, SyntaxTree, enclosing_node, parse_tree};
use crate::parser::types::{DependencyInfo, DocumentKind, NodeRef};

/// Extractor for package.json files
#[derive(Default)]
pub struct PackageJsonExtractor {
    cache: ParseCache,
}

impl PackageJsonExtractor {
    /// Dependency field names to extract
    const DEPENDENCY_SECTIONS: [&'static str; 4] = [
        "dependencies",
        "devDependencies",
        "peerDependencies",
        "optionalDependencies",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Unescaped value of a JSON string node
    fn string_value(tree: &SyntaxTree, node: Node<'_>) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        serde_json::from_str(tree.node_text(node)).ok()
    }

    fn node_ref(node: Node<'_>) -> NodeRef {
        NodeRef::new(node.start_byte(), node.end_byte(), true)
    }

    fn root_object<'t>(tree: &'t SyntaxTree) -> Option<Node<'t>> {
        let root = tree.root();
        let mut cursor = root.walk();
        root.named_children(&mut cursor)
            .find(|child| child.kind() == "object")
    }

    /// Dependency declared by `pair`, provided it is a `"name": "version"`
    /// entry of a dependency section in the root object
    fn recognize_entry(tree: &SyntaxTree, pair: Node<'_>) -> Option<DependencyInfo> {
        if pair.kind() != "pair" {
            return None;
        }

        let section = pair.parent().filter(|n| n.kind() == "object")?;
        let section_pair = section.parent().filter(|n| n.kind() == "pair")?;
        if section_pair.child_by_field_name("value")?.id() != section.id() {
            return None;
        }

        let section_name = Self::string_value(tree, section_pair.child_by_field_name("key")?)?;
        if !Self::DEPENDENCY_SECTIONS.contains(&section_name.as_str()) {
            return None;
        }

        let root_object = section_pair.parent().filter(|n| n.kind() == "object")?;
        if root_object.parent()?.kind() != "document" {
            return None;
        }

        let key_node = pair.child_by_field_name("key")?;
        let value_node = pair.child_by_field_name("value")?;
        let name = Self::string_value(tree, key_node)?;
        let version = Self::string_value(tree, value_node)?;

        Some(DependencyInfo::new(
            name,
            version,
            Self::node_ref(key_node),
            Self::node_ref(value_node),
        ))
    }
}

impl Extractor for PackageJsonExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PackageJson
    }

    fn parse(&self, document: &TextDocument) -> Option<Arc<SyntaxTree>> {
        self.cache.get_or_parse(document, |text| {
            parse_tree(&tree_sitter_json::LANGUAGE.into(), "JSON", text)
        })
    }

    fn dependencies_info(&self, tree: &SyntaxTree) -> Vec<DependencyInfo> {
        let Some(root_object) = Self::root_object(tree) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut cursor = root_object.walk();

        for section_pair in root_object.named_children(&mut cursor) {
            let Some(section) = section_pair
                .child_by_field_name("value")
                .filter(|n| n.kind() == "object")
            else {
                continue;
            };

            let mut inner = section.walk();
            results.extend(
                section
                    .named_children(&mut inner)
                    .filter_map(|pair| Self::recognize_entry(tree, pair)),
            );
        }

        results
    }

    fn dependency_info_by_offset(
        &self,
        tree: &SyntaxTree,
        offset: usize,
    ) -> Option<DependencyInfo> {
        let pair = enclosing_node(tree, offset, &["pair"])?;
        let info = Self::recognize_entry(tree, pair)?;

        (info.name_node.contains(offset) || info.version_node.contains(offset)).then_some(info)
    }

    fn invalidate(&self, uri: &Url) {
        self.cache.invalidate(uri);
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}
