use tower_lsp::lsp_types::DiagnosticSeverity;

use super::{DiagnosticRule, NodeDiagnostic, RuleContext};
use crate::links::{mdn_url, replacements_doc_url};
use crate::version::types::ModuleReplacement;

/// Reports community replacement advice on the dependency name
pub struct ReplacementRule;

/// Message and optional documentation link for a replacement advisory
pub fn replacement_info(replacement: &ModuleReplacement) -> (String, Option<String>) {
    match replacement {
        ModuleReplacement::Native {
            replacement,
            node_version,
            mdn_path,
        } => (
            format!("This can be replaced with {replacement}, available since Node {node_version}."),
            Some(mdn_url(mdn_path)),
        ),
        ModuleReplacement::Simple { replacement } => (
            format!(
                "The community has flagged this package as redundant, with the advice:\n{replacement}."
            ),
            None,
        ),
        ModuleReplacement::Documented { doc_path } => (
            "The community has flagged this package as having more performant alternatives."
                .to_string(),
            Some(replacements_doc_url(doc_path)),
        ),
        ModuleReplacement::None => (
            "This package has been flagged as no longer needed, and its functionality is likely available natively in all engines."
                .to_string(),
            None,
        ),
    }
}

impl DiagnosticRule for ReplacementRule {
    fn name(&self) -> &'static str {
        "replacement"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<NodeDiagnostic> {
        let (message, link) = replacement_info(ctx.replacement?);

        Some(
            NodeDiagnostic::new(ctx.dependency.name_node, DiagnosticSeverity::WARNING, message)
                .with_code("replacement", link),
        )
    }
}
