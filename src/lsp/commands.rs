//! `workspace/executeCommand` commands and their argument decoding

use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use tower_lsp::lsp_types::{Range, Url};

use crate::config::UPDATE_VERSION_DEBOUNCE_MS;

/// Replace a range of a document with a new specifier
pub const UPDATE_VERSION: &str = "npmx.updateVersion";
/// Drop every memoized registry response and parse tree
pub const CLEAR_CACHES: &str = "npmx.clearCaches";
/// Reveal a location in the editor
pub const OPEN_LOCATION: &str = "npmx.openLocation";
/// Open the npmx.dev source view of a file under `node_modules`
pub const OPEN_FILE_IN_NPMX: &str = "npmx.openFileInNpmx";
pub const OPEN_IN_BROWSER: &str = "npmx.openInBrowser";

pub const COMMANDS: [&str; 5] = [
    UPDATE_VERSION,
    CLEAR_CACHES,
    OPEN_LOCATION,
    OPEN_FILE_IN_NPMX,
    OPEN_IN_BROWSER,
];

/// Decoded `npmx.updateVersion` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateVersionArgs {
    pub uri: Url,
    pub range: Range,
    pub new_text: String,
}

impl UpdateVersionArgs {
    /// `[uri, range, newText]`; `None` when any argument is missing or malformed
    pub fn from_arguments(arguments: &[Value]) -> Option<Self> {
        match arguments {
            [uri, range, new_text, ..] => Some(Self {
                uri: decode(uri)?,
                range: decode(range)?,
                new_text: decode(new_text)?,
            }),
            _ => None,
        }
    }
}

/// Decoded `npmx.openLocation` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLocationArgs {
    pub uri: Url,
    pub range: Range,
}

impl OpenLocationArgs {
    pub fn from_arguments(arguments: &[Value]) -> Option<Self> {
        match arguments {
            [uri, range, ..] => Some(Self {
                uri: decode(uri)?,
                range: decode(range)?,
            }),
            _ => None,
        }
    }
}

/// Decoded `npmx.openFileInNpmx` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OpenFileArgs {
    pub uri: Url,
    /// Editor selection; only given when the file is the active one
    pub selection: Option<Range>,
}

impl OpenFileArgs {
    /// `[uri, selection?]`
    pub fn from_arguments(arguments: &[Value]) -> Option<Self> {
        match arguments {
            [uri] => Some(Self {
                uri: decode(uri)?,
                selection: None,
            }),
            [uri, selection, ..] => Some(Self {
                uri: decode(uri)?,
                selection: decode(selection),
            }),
            [] => None,
        }
    }

    /// One-based line span of the selection
    pub fn lines(&self) -> Option<(u32, u32)> {
        self.selection
            .map(|range| (range.start.line + 1, range.end.line + 1))
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

/// Leading-edge debounce: the first call runs, calls arriving within the
/// window after the previous call are dropped.
pub struct LeadingDebounce {
    window: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Default for LeadingDebounce {
    fn default() -> Self {
        Self::new(Duration::from_millis(UPDATE_VERSION_DEBOUNCE_MS))
    }
}

impl LeadingDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_call: Mutex::new(None),
        }
    }

    /// Whether this call should run
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut last_call = self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let quiet = last_call.is_none_or(|last| now.duration_since(last) >= self.window);
        *last_call = Some(now);
        quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn update_version_args_decode() {
        let args = UpdateVersionArgs::from_arguments(&[
            json!("file:///app/package.json"),
            json!({"start": {"line": 2, "character": 15}, "end": {"line": 2, "character": 22}}),
            json!("^4.17.21"),
        ])
        .unwrap();

        assert_eq!(
            args,
            UpdateVersionArgs {
                uri: Url::parse("file:///app/package.json").unwrap(),
                range: Range::new(Position::new(2, 15), Position::new(2, 22)),
                new_text: "^4.17.21".to_string(),
            }
        );
    }

    #[test]
    fn update_version_args_reject_incomplete_arguments() {
        assert_eq!(UpdateVersionArgs::from_arguments(&[]), None);
        assert_eq!(
            UpdateVersionArgs::from_arguments(&[json!("file:///a"), json!("not a range"), json!("1.0.0")]),
            None
        );
        assert_eq!(
            UpdateVersionArgs::from_arguments(&[json!("file:///a"), json!(Range::default())]),
            None
        );
    }

    #[test]
    fn open_location_args_decode() {
        let args =
            OpenLocationArgs::from_arguments(&[json!("file:///w/pnpm-workspace.yaml"), json!(Range::default())])
                .unwrap();

        assert_eq!(args.uri.as_str(), "file:///w/pnpm-workspace.yaml");
        assert_eq!(args.range, Range::default());
    }

    #[test]
    fn open_file_args_decode_optional_selection() {
        let uri = json!("file:///app/node_modules/lodash/lodash.js");
        let selection = Range::new(Position::new(9, 0), Position::new(14, 3));

        let without = OpenFileArgs::from_arguments(&[uri.clone()]).unwrap();
        assert_eq!(without.selection, None);
        assert_eq!(without.lines(), None);

        let with = OpenFileArgs::from_arguments(&[uri, json!(selection)]).unwrap();
        assert_eq!(with.selection, Some(selection));
        assert_eq!(with.lines(), Some((10, 15)));

        assert_eq!(OpenFileArgs::from_arguments(&[]), None);
    }

    #[tokio::test(start_paused = true)]
    async fn leading_debounce_drops_calls_inside_window() {
        let debounce = LeadingDebounce::new(Duration::from_millis(300));

        assert!(debounce.try_acquire());
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!debounce.try_acquire());
        tokio::time::advance(Duration::from_millis(250)).await;
        assert!(!debounce.try_acquire());
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(debounce.try_acquire());
    }
}
