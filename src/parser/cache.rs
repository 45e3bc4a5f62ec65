//! Per-document parse cache keyed by content fingerprint

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::parser::document::TextDocument;
use crate::parser::traits::{ParseError, SyntaxTree};

#[derive(Default)]
pub struct ParseCache {
    entries: Mutex<HashMap<Url, (u64, Arc<SyntaxTree>)>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Url, (u64, Arc<SyntaxTree>)>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached tree for the document, parsing with `parse` when the content changed
    pub fn get_or_parse<F>(&self, document: &TextDocument, parse: F) -> Option<Arc<SyntaxTree>>
    where
        F: FnOnce(&str) -> Result<tree_sitter::Tree, ParseError>,
    {
        let fingerprint = document.fingerprint();

        if let Some((cached, tree)) = self.entries().get(document.uri())
            && *cached == fingerprint
        {
            return Some(Arc::clone(tree));
        }

        match parse(document.text()) {
            Ok(tree) => {
                debug!("Parsed {}", document.uri());
                let tree = Arc::new(SyntaxTree::new(tree, Arc::from(document.text())));
                self.entries()
                    .insert(document.uri().clone(), (fingerprint, Arc::clone(&tree)));
                Some(tree)
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", document.uri(), e);
                self.entries().remove(document.uri());
                None
            }
        }
    }

    pub fn invalidate(&self, uri: &Url) {
        self.entries().remove(uri);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
