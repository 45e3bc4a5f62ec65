use tower_lsp::lsp_types::{DiagnosticSeverity, DiagnosticTag};

use super::{DiagnosticRule, NodeDiagnostic, RuleContext};
use crate::links::npmx_package_url;

pub struct DeprecationRule;

impl DiagnosticRule for DeprecationRule {
    fn name(&self) -> &'static str {
        "deprecation"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<NodeDiagnostic> {
        let version = ctx.supported()?.semver.as_str();
        let note = ctx.package.version_meta(version)?.deprecated.as_deref()?;
        let name = &ctx.dependency.name;

        let mut diagnostic = NodeDiagnostic::new(
            ctx.dependency.version_node,
            DiagnosticSeverity::ERROR,
            format!("{name} v{version} has been deprecated: {note}"),
        )
        .with_code("deprecation", Some(npmx_package_url(name, Some(version))));
        diagnostic.tags = Some(vec![DiagnosticTag::DEPRECATED]);

        Some(diagnostic)
    }
}
