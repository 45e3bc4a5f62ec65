use tower_lsp::lsp_types::DiagnosticSeverity;

use super::{DiagnosticRule, NodeDiagnostic, RuleContext};
use crate::links::npmx_package_url;
use crate::version::specifier::is_dist_tag_like;

/// Flags specifiers that follow a mutable dist-tag instead of a version
pub struct DistTagRule;

impl DiagnosticRule for DistTagRule {
    fn name(&self) -> &'static str {
        "distTag"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<NodeDiagnostic> {
        let tag = ctx.supported()?.semver.as_str();

        let is_published = ctx.package.dist_tags.contains_key(tag);
        if !is_published && !is_dist_tag_like(tag) {
            return None;
        }

        let name = &ctx.dependency.name;
        Some(
            NodeDiagnostic::new(
                ctx.dependency.version_node,
                DiagnosticSeverity::WARNING,
                format!(
                    "\"{name}\" uses the \"{tag}\" version tag. This may lead to unexpected breaking changes. Consider pinning to a specific version."
                ),
            )
            .with_code("dist-tag", Some(npmx_package_url(name, None))),
        )
    }
}
