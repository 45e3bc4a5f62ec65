//! Hover content for a dependency under the cursor

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::links::{jsr_package_url, npm_package_url, npmx_docs_url, npmx_package_url};
use crate::lsp::resolver::{DependencyResolver, effective_parsed};
use crate::parser::document::TextDocument;
use crate::parser::traits::Extractor;
use crate::version::specifier::Protocol;
use crate::version::store::PackageStore;

pub async fn hover(
    document: &TextDocument,
    position: Position,
    extractor: &dyn Extractor,
    store: &PackageStore,
    resolver: &DependencyResolver,
) -> Option<Hover> {
    let tree = extractor.parse(document)?;
    let offset = document.offset_at(position);
    let dependency = extractor.dependency_info_by_offset(&tree, offset)?;

    let hovered_node = if dependency.name_node.contains(offset) {
        dependency.name_node
    } else {
        dependency.version_node
    };
    let range = extractor.node_range(document, &hovered_node);

    let dependency = resolver.resolve(document.uri(), dependency).await;
    let parsed = effective_parsed(&dependency)?;
    let name = &dependency.name;

    let markdown = if parsed.protocol == Some(Protocol::Jsr) {
        format!(
            "[View on jsr.io]({}) | Not on npmx",
            jsr_package_url(name, &parsed.semver)
        )
    } else if !parsed.is_supported() {
        return None;
    } else {
        match store.package_info(name).await {
            None => "Unable to fetch package information".to_string(),
            Some(package) => {
                let mut markdown = String::new();
                if package
                    .version_meta(&parsed.semver)
                    .is_some_and(|meta| meta.provenance)
                {
                    markdown.push_str(&format!(
                        "[Verified provenance]({}#provenance)\n\n",
                        npm_package_url(name, &parsed.semver)
                    ));
                }
                markdown.push_str(&format!(
                    "[View on npmx.dev]({}) | [View docs on npmx.dev]({})",
                    npmx_package_url(name, None),
                    npmx_docs_url(name, &parsed.semver)
                ));
                markdown
            }
        }
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: Some(range),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use indexmap::IndexMap;
    use tower_lsp::lsp_types::Url;

    use crate::config::CacheConfig;
    use crate::parser::package_json::PackageJsonExtractor;
    use crate::version::error::RegistryError;
    use crate::version::registry::{MockRegistry, MockReplacementSource, MockVulnerabilitySource};
    use crate::version::types::{PackageInfo, VersionMeta};
    use crate::workspace::fs::MockFileSystem;

    fn store_with(registry: MockRegistry) -> PackageStore {
        PackageStore::new(
            Arc::new(registry),
            Arc::new(MockReplacementSource::new()),
            Arc::new(MockVulnerabilitySource::new()),
            &CacheConfig::default(),
        )
    }

    fn lodash_registry() -> MockRegistry {
        let mut registry = MockRegistry::new();
        registry.expect_fetch_package_info().returning(|_| {
            Ok(PackageInfo::new(
                HashMap::from([("latest".to_string(), "4.17.21".to_string())]),
                IndexMap::from([
                    ("4.17.20".to_string(), VersionMeta::default()),
                    (
                        "4.17.21".to_string(),
                        VersionMeta {
                            deprecated: None,
                            provenance: true,
                        },
                    ),
                ]),
            ))
        });
        registry
    }

    async fn hover_text(text: &str, position: Position, registry: MockRegistry) -> Option<String> {
        let document = TextDocument::new(
            Url::parse("file:///app/package.json").unwrap(),
            1,
            text,
        );
        let resolver = DependencyResolver::new(Arc::new(MockFileSystem::new()));
        hover(
            &document,
            position,
            &PackageJsonExtractor::new(),
            &store_with(registry),
            &resolver,
        )
        .await
        .map(|hover| match hover.contents {
            HoverContents::Markup(markup) => markup.value,
            other => panic!("unexpected hover contents: {other:?}"),
        })
    }

    #[tokio::test]
    async fn hover_links_provenance_package_and_docs() {
        let text = hover_text(
            r#"{"dependencies": {"lodash": "4.17.21"}}"#,
            Position::new(0, 31),
            lodash_registry(),
        )
        .await
        .unwrap();

        assert_eq!(
            text,
            "[Verified provenance](https://www.npmjs.com/package/lodash/v/4.17.21#provenance)\n\n\
             [View on npmx.dev](https://npmx.dev/package/lodash) | \
             [View docs on npmx.dev](https://npmx.dev/docs/lodash/v/4.17.21)"
        );
    }

    #[tokio::test]
    async fn hover_on_name_without_provenance() {
        let text = hover_text(
            r#"{"dependencies": {"lodash": "^4.17.20"}}"#,
            Position::new(0, 21),
            lodash_registry(),
        )
        .await
        .unwrap();

        assert_eq!(
            text,
            "[View on npmx.dev](https://npmx.dev/package/lodash) | \
             [View docs on npmx.dev](https://npmx.dev/docs/lodash/v/4.17.20)"
        );
    }

    #[tokio::test]
    async fn hover_reports_unavailable_package() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_package_info()
            .returning(|name| Err(RegistryError::NotFound(name.to_string())));

        let text = hover_text(
            r#"{"dependencies": {"nope": "1.0.0"}}"#,
            Position::new(0, 20),
            registry,
        )
        .await;

        assert_eq!(text.as_deref(), Some("Unable to fetch package information"));
    }

    #[tokio::test]
    async fn hover_points_jsr_packages_at_jsr() {
        let mut registry = MockRegistry::new();
        registry.expect_fetch_package_info().never();

        let text = hover_text(
            r#"{"dependencies": {"@std/fmt": "jsr:^1.0.3"}}"#,
            Position::new(0, 22),
            registry,
        )
        .await;

        assert_eq!(
            text.as_deref(),
            Some("[View on jsr.io](https://jsr.io/@std/fmt@1.0.3) | Not on npmx")
        );
    }

    #[tokio::test]
    async fn hover_skips_unsupported_specifiers() {
        let mut registry = MockRegistry::new();
        registry.expect_fetch_package_info().never();

        let text = hover_text(
            r#"{"dependencies": {"shared": "workspace:*"}}"#,
            Position::new(0, 21),
            registry,
        )
        .await;

        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn hover_outside_dependencies_is_empty() {
        let text = hover_text(
            r#"{"name": "app", "dependencies": {}}"#,
            Position::new(0, 3),
            MockRegistry::new(),
        )
        .await;

        assert_eq!(text, None);
    }
}
