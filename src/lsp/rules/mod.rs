//! Diagnostic rules evaluated per dependency
//!
//! A rule is a pure check over one dependency and the registry data fetched
//! for it. Remote lookups happen before the rules run, so every rule can be
//! tested without a network or a runtime.

mod deprecation;
mod dist_tag;
mod replacement;
mod upgrade;
mod vulnerability;

pub use deprecation::DeprecationRule;
pub use dist_tag::DistTagRule;
pub use replacement::ReplacementRule;
pub use upgrade::UpgradeRule;
pub use vulnerability::VulnerabilityRule;

use tower_lsp::lsp_types::{DiagnosticSeverity, DiagnosticTag};

use crate::config::DiagnosticsConfig;
use crate::parser::types::{DependencyInfo, NodeRef};
use crate::version::semver::parse_exact;
use crate::version::specifier::{ParsedVersion, RangePrefix};
use crate::version::types::{Advisory, ModuleReplacement, PackageInfo};

/// Everything a rule may look at for one dependency
pub struct RuleContext<'a> {
    pub dependency: &'a DependencyInfo,
    /// Parsed effective specifier; `None` for URL-like or unknown specifiers
    pub parsed: Option<&'a ParsedVersion>,
    pub package: &'a PackageInfo,
    pub replacement: Option<&'a ModuleReplacement>,
    pub advisories: &'a [Advisory],
}

impl RuleContext<'_> {
    /// Parsed specifier when it is registry-backed
    pub fn supported(&self) -> Option<&ParsedVersion> {
        self.parsed.filter(|parsed| parsed.is_supported())
    }

    pub fn exact_version(&self) -> Option<&str> {
        exact_version(self.parsed)
    }
}

/// Exact registry version pinned by a specifier: no range prefix and a valid semver core
pub fn exact_version(parsed: Option<&ParsedVersion>) -> Option<&str> {
    parsed
        .filter(|parsed| parsed.is_supported() && parsed.prefix == RangePrefix::None)
        .map(|parsed| parsed.semver.as_str())
        .filter(|semver| parse_exact(semver).is_some())
}

/// Rule output anchored to a node; converted to an LSP diagnostic by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDiagnostic {
    pub node: NodeRef,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub code: Option<String>,
    /// Documentation link attached to the code
    pub code_href: Option<String>,
    pub tags: Option<Vec<DiagnosticTag>>,
    pub data: Option<serde_json::Value>,
}

impl NodeDiagnostic {
    pub fn new(node: NodeRef, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            node,
            message: message.into(),
            severity,
            code: None,
            code_href: None,
            tags: None,
            data: None,
        }
    }

    pub fn with_code(mut self, code: &str, href: Option<String>) -> Self {
        self.code = Some(code.to_string());
        self.code_href = href;
        self
    }
}

pub trait DiagnosticRule: Send + Sync {
    /// Configuration key of the rule
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &RuleContext<'_>) -> Option<NodeDiagnostic>;
}

/// Rules switched on by the configuration, in evaluation order
pub fn enabled_rules(config: &DiagnosticsConfig) -> Vec<&'static dyn DiagnosticRule> {
    let candidates: [(bool, &'static dyn DiagnosticRule); 5] = [
        (config.upgrade, &UpgradeRule),
        (config.deprecation, &DeprecationRule),
        (config.dist_tag, &DistTagRule),
        (config.replacement, &ReplacementRule),
        (config.vulnerability, &VulnerabilityRule),
    ];

    candidates
        .into_iter()
        .filter_map(|(enabled, rule)| enabled.then_some(rule))
        .collect()
}
