//! Update-status code lenses on dependency specifiers
//!
//! Lenses are listed without any network access; the registry lookup happens
//! in `codeLens/resolve`, one lens at a time.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_lsp::lsp_types::{CodeLens, Command, Url};

use crate::lsp::commands::UPDATE_VERSION;
use crate::lsp::resolver::supported_parsed;
use crate::parser::document::TextDocument;
use crate::parser::traits::Extractor;
use crate::version::semver::{UpdateType, update_type};
use crate::version::specifier::parse_version;
use crate::version::store::PackageStore;

/// State carried from listing to resolving a lens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LensData {
    uri: Url,
    name: String,
    version: String,
}

pub fn code_lenses(document: &TextDocument, extractor: &dyn Extractor) -> Vec<CodeLens> {
    let Some(tree) = extractor.parse(document) else {
        return Vec::new();
    };

    extractor
        .dependencies_info(&tree)
        .into_iter()
        .filter(|dependency| supported_parsed(dependency).is_some())
        .map(|dependency| {
            let data = LensData {
                uri: document.uri().clone(),
                name: dependency.name,
                version: dependency.version,
            };
            CodeLens {
                range: extractor.node_range(document, &dependency.version_node),
                command: None,
                data: serde_json::to_value(data).ok(),
            }
        })
        .collect()
}

fn label_only(title: &str) -> Command {
    Command {
        title: title.to_string(),
        command: String::new(),
        arguments: None,
    }
}

pub async fn resolve_code_lens(mut lens: CodeLens, store: &PackageStore) -> CodeLens {
    let Some(data) = lens
        .data
        .clone()
        .and_then(|value| serde_json::from_value::<LensData>(value).ok())
    else {
        return lens;
    };
    let Some(parsed) = parse_version(&data.version) else {
        return lens;
    };

    let latest = store
        .package_info(&data.name)
        .await
        .and_then(|package| package.latest().map(str::to_string));

    lens.command = Some(match latest {
        None => label_only("? unknown"),
        Some(latest) => match update_type(&parsed.semver, &latest) {
            UpdateType::None => label_only("✓ latest"),
            kind => {
                let new_version = parsed.with_semver(latest).to_string();
                Command {
                    title: format!("⬆ {new_version} ({kind})"),
                    command: UPDATE_VERSION.to_string(),
                    arguments: Some(vec![
                        json!(data.uri),
                        json!(lens.range),
                        json!(new_version),
                    ]),
                }
            }
        },
    });
    lens
}
