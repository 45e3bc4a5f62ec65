//! In-memory text of an open document with offset/position conversion
//!
//! Offsets are UTF-8 byte offsets into the text (what tree-sitter reports).
//! Positions follow LSP: zero-based line and UTF-16 code unit column.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range, Url};

#[derive(Debug, Clone)]
pub struct TextDocument {
    uri: Url,
    version: i32,
    text: Arc<str>,
    line_starts: Vec<usize>,
    fingerprint: u64,
}

impl TextDocument {
    pub fn new(uri: Url, version: i32, text: impl Into<Arc<str>>) -> Self {
        let text: Arc<str> = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);

        Self {
            uri,
            version,
            line_starts,
            fingerprint: hasher.finish(),
            text,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Content hash; equal texts share a fingerprint regardless of version
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Last path segment of the URI, e.g. `package.json`
    pub fn file_name(&self) -> Option<&str> {
        self.uri.path_segments()?.next_back()
    }

    pub fn offset_at(&self, position: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line as usize) else {
            return self.text.len();
        };

        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .copied()
            .unwrap_or(self.text.len());

        let mut units = 0u32;
        for (i, ch) in self.text[line_start..line_end].char_indices() {
            if units >= position.character || ch == '\n' || ch == '\r' {
                return line_start + i;
            }
            units += ch.len_utf16() as u32;
        }
        line_end
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset].encode_utf16().count();

        Position::new(line as u32, character as u32)
    }

    pub fn range_at(&self, start: usize, end: usize) -> Range {
        Range::new(self.position_at(start), self.position_at(end))
    }
}
