use tower_lsp::lsp_types::DiagnosticSeverity;

use super::{DiagnosticRule, NodeDiagnostic, RuleContext};
use crate::links::osv_vulnerability_url;

/// Number of advisory ids spelled out in the message
const LISTED_ADVISORIES: usize = 3;

/// Reports known advisories for an exactly pinned version
pub struct VulnerabilityRule;

impl DiagnosticRule for VulnerabilityRule {
    fn name(&self) -> &'static str {
        "vulnerability"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<NodeDiagnostic> {
        let version = ctx.exact_version()?;
        let first = ctx.advisories.first()?;

        let ids: Vec<&str> = ctx
            .advisories
            .iter()
            .take(LISTED_ADVISORIES)
            .map(|a| a.id.as_str())
            .collect();
        let more = match ctx.advisories.len().saturating_sub(LISTED_ADVISORIES) {
            0 => String::new(),
            remaining => format!(" and {remaining} more"),
        };

        let count = ctx.advisories.len();
        let noun = if count == 1 { "vulnerability" } else { "vulnerabilities" };

        Some(
            NodeDiagnostic::new(
                ctx.dependency.version_node,
                DiagnosticSeverity::WARNING,
                format!(
                    "{} v{} has {} known {}: {}{}",
                    ctx.dependency.name,
                    version,
                    count,
                    noun,
                    ids.join(", "),
                    more
                ),
            )
            .with_code(&first.id, Some(osv_vulnerability_url(&first.id))),
        )
    }
}
