use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default cache time-to-live in milliseconds (24 hours)
pub const CACHE_TTL_ONE_DAY: u64 = 24 * 60 * 60 * 1000;

/// Default maximum number of entries kept by each memoized cache
pub const DEFAULT_CACHE_MAX_SIZE: usize = 500;

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Batch window for publishing diagnostics of one collection pass
pub const DIAGNOSTICS_DEBOUNCE_MS: u64 = 100;

/// Window during which repeated `npmx.updateVersion` invocations are dropped
pub const UPDATE_VERSION_DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Remote endpoints
// =============================================================================

pub const NPM_REGISTRY: &str = "https://registry.npmjs.org";
pub const NPMX_DEV: &str = "https://npmx.dev";
pub const NPMX_DEV_API: &str = "https://npmx.dev/api";
pub const OSV_API: &str = "https://api.osv.dev";

// =============================================================================
// File names
// =============================================================================

pub const PACKAGE_JSON_BASENAME: &str = "package.json";
pub const PNPM_WORKSPACE_BASENAME: &str = "pnpm-workspace.yaml";

// =============================================================================
// Editor-facing text
// =============================================================================

/// Name reported as the `source` of every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "npmx";

pub const UPGRADE_MESSAGE_PREFIX: &str = "New version available: ";

/// Prefix of the related-information entry pointing at a catalog definition
pub const CATALOG_RELATED_INFO_PREFIX: &str = "Catalog entry: ";

pub const VERSION_TRIGGER_CHARACTERS: [&str; 14] = [
    ".", "^", "~", "\"", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
];

/// LSP configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LspConfig {
    pub hover: HoverConfig,
    pub completion: CompletionConfig,
    pub diagnostics: DiagnosticsConfig,
    pub code_lens: CodeLensConfig,
    pub document_link: DocumentLinkConfig,
    pub cache: CacheConfig,
    pub registry: RegistryConfig,
}

impl LspConfig {
    /// Read the configuration from an editor settings payload.
    ///
    /// Accepts either `{ "npmx": { ... } }` or the settings object itself.
    /// Anything that does not deserialize falls back to defaults.
    pub fn from_settings(value: &serde_json::Value) -> Self {
        let settings = value.get("npmx").unwrap_or(value);
        serde_json::from_value(settings.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HoverConfig {
    pub enabled: bool,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Which registry versions are offered as completion items
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionMode {
    #[default]
    All,
    ProvenanceOnly,
    Off,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionConfig {
    pub version: CompletionMode,
    pub exclude_prerelease: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            version: CompletionMode::All,
            exclude_prerelease: true,
        }
    }
}

/// Diagnostic rules that can be toggled individually
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticsConfig {
    pub upgrade: bool,
    pub deprecation: bool,
    pub dist_tag: bool,
    pub replacement: bool,
    pub vulnerability: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            upgrade: true,
            deprecation: true,
            dist_tag: true,
            replacement: true,
            vulnerability: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CodeLensConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentLinkConfig {
    pub enabled: bool,
}

impl Default for DocumentLinkConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Time-to-live of fetched registry data in milliseconds
    pub ttl: u64,
    /// Maximum number of entries per cache
    pub max_size: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: CACHE_TTL_ONE_DAY,
            max_size: DEFAULT_CACHE_MAX_SIZE,
        }
    }
}

/// Base URLs of the remote services
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub npm: String,
    pub npmx: String,
    pub osv: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm: NPM_REGISTRY.to_string(),
            npmx: NPMX_DEV_API.to_string(),
            osv: OSV_API.to_string(),
        }
    }
}

/// Returns the path to the data directory for npmx-lsp.
/// Uses $XDG_DATA_HOME/npmx-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/npmx-lsp,
/// or ./npmx-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("npmx-lsp.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("npmx-lsp")
}
