use serde_json::json;
use tower_lsp::lsp_types::DiagnosticSeverity;

use super::{DiagnosticRule, NodeDiagnostic, RuleContext};
use crate::config::UPGRADE_MESSAGE_PREFIX;
use crate::parser::types::DependencyInfo;
use crate::version::semver::{lt, parse_exact, prerelease_id};
use crate::version::specifier::ParsedVersion;

/// Flags a specifier that trails `latest`, or a prerelease that trails a
/// newer prerelease on the same channel
pub struct UpgradeRule;

impl UpgradeRule {
    fn diagnostic(dependency: &DependencyInfo, parsed: &ParsedVersion, version: &str) -> NodeDiagnostic {
        let target = parsed.with_semver(version).to_string();
        let mut diagnostic = NodeDiagnostic::new(
            dependency.version_node,
            DiagnosticSeverity::HINT,
            format!("{UPGRADE_MESSAGE_PREFIX}{target}"),
        );
        diagnostic.data = Some(json!({ "target": target }));
        diagnostic
    }
}

impl DiagnosticRule for UpgradeRule {
    fn name(&self) -> &'static str {
        "upgrade"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<NodeDiagnostic> {
        let parsed = ctx.supported()?;
        let current = parsed.semver.as_str();

        if let Some(latest) = ctx.package.latest()
            && lt(current, latest)
        {
            return Some(Self::diagnostic(ctx.dependency, parsed, latest));
        }

        let channel = prerelease_id(current)?;

        // Several tags may share the channel; the highest candidate wins
        ctx.package
            .dist_tags
            .iter()
            .filter(|(tag, _)| tag.as_str() != "latest")
            .map(|(_, version)| version.as_str())
            .filter(|version| prerelease_id(version).as_deref() == Some(channel.as_str()))
            .filter(|version| lt(current, version))
            .max_by(|a, b| parse_exact(a).cmp(&parse_exact(b)))
            .map(|version| Self::diagnostic(ctx.dependency, parsed, version))
    }
}
