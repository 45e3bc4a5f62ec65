//! Diagnostics collection for an open document
//!
//! One collection pass per document revision:
//!
//! 1. extract the dependencies of the document
//! 2. evaluate every dependency concurrently (catalog resolution, registry
//!    lookups, enabled rules); a failing dependency contributes nothing
//! 3. publish the accumulated list with a trailing debounce while
//!    evaluations are still completing, and once more when all are done
//!
//! Every publish replaces the document's whole diagnostic set. A new pass does
//! not clear the set on start: the previous findings stay visible until its
//! first flush replaces them, so an edit never blanks the editor's markers.
//!
//! Each [`DiagnosticsEngine::track`] call starts a new generation for the
//! document's URI. A pass whose generation is no longer the latest stops
//! publishing, whether the newer pass came from an edit or from a
//! configuration change over the same text.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
#[cfg(test)]
use mockall::automock;
use tokio::time::Instant;
use tower_lsp::Client;
use tower_lsp::lsp_types::{
    CodeDescription, Diagnostic, DiagnosticRelatedInformation, NumberOrString, Url,
};
use tracing::{debug, warn};

use crate::config::{
    CATALOG_RELATED_INFO_PREFIX, DIAGNOSTIC_SOURCE, DIAGNOSTICS_DEBOUNCE_MS, DiagnosticsConfig,
};
use crate::lsp::resolver::{DependencyResolver, effective_parsed};
use crate::lsp::rules::{DiagnosticRule, NodeDiagnostic, RuleContext, enabled_rules, exact_version};
use crate::parser::document::TextDocument;
use crate::parser::traits::Extractor;
use crate::parser::types::DependencyInfo;
use crate::version::store::PackageStore;

/// Sink for published diagnostics
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DiagnosticsPublisher: Send + Sync {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>);
}

#[async_trait]
impl DiagnosticsPublisher for Client {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        self.publish_diagnostics(uri, diagnostics, None).await;
    }
}

/// Collaborators of one collection pass
pub struct CollectionContext<'a> {
    pub extractor: &'a dyn Extractor,
    pub store: &'a PackageStore,
    pub resolver: &'a DependencyResolver,
    pub config: &'a DiagnosticsConfig,
}

pub struct DiagnosticsEngine {
    publisher: Box<dyn DiagnosticsPublisher>,
    /// Generation of the newest pass per document
    generations: Mutex<HashMap<Url, u64>>,
    next_generation: AtomicU64,
    debounce: Duration,
}

impl DiagnosticsEngine {
    pub fn new(publisher: impl DiagnosticsPublisher + 'static) -> Self {
        Self {
            publisher: Box::new(publisher),
            generations: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            debounce: Duration::from_millis(DIAGNOSTICS_DEBOUNCE_MS),
        }
    }

    fn generations(&self) -> std::sync::MutexGuard<'_, HashMap<Url, u64>> {
        self.generations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, uri: &Url, generation: u64) -> bool {
        self.generations().get(uri) == Some(&generation)
    }

    /// Stop publishing for `uri` and clear what was published
    pub async fn forget(&self, uri: &Url) {
        self.generations().remove(uri);
        self.publisher.publish(uri.clone(), Vec::new()).await;
    }

    /// Start a new generation for `document`'s URI; passes of older
    /// generations stop publishing from now on
    pub fn track(&self, document: &TextDocument) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.generations()
            .insert(document.uri().clone(), generation);
        generation
    }

    /// Track `document` and run a collection pass for it
    pub async fn collect(&self, document: &TextDocument, ctx: &CollectionContext<'_>) {
        let generation = self.track(document);
        self.collect_tracked(document, generation, ctx).await;
    }

    /// Run a collection pass for the `generation` returned by [`Self::track`]
    pub async fn collect_tracked(
        &self,
        document: &TextDocument,
        generation: u64,
        ctx: &CollectionContext<'_>,
    ) {
        let dependencies = ctx
            .extractor
            .parse(document)
            .map(|tree| ctx.extractor.dependencies_info(&tree))
            .unwrap_or_default();

        debug!(
            "Collecting diagnostics for {} dependencies in {}",
            dependencies.len(),
            document.uri()
        );

        let rules = enabled_rules(ctx.config);
        let mut pending: FuturesUnordered<_> = dependencies
            .into_iter()
            .map(|dependency| {
                let name = dependency.name.clone();
                AssertUnwindSafe(evaluate_dependency(document, ctx, &rules, dependency))
                    .catch_unwind()
                    .map(move |result| {
                        result.unwrap_or_else(|_| {
                            warn!("Failed to check {}", name);
                            Vec::new()
                        })
                    })
            })
            .collect();

        let mut diagnostics = Vec::new();
        let flush = tokio::time::sleep(self.debounce);
        tokio::pin!(flush);
        let mut flush_armed = false;

        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some(found) if !found.is_empty() => {
                        diagnostics.extend(found);
                        flush.as_mut().reset(Instant::now() + self.debounce);
                        flush_armed = true;
                    }
                    Some(_) => {}
                    None => break,
                },
                _ = &mut flush, if flush_armed => {
                    flush_armed = false;
                    if !self
                        .publish_if_current(document, generation, diagnostics.clone())
                        .await
                    {
                        return;
                    }
                }
            }
        }

        self.publish_if_current(document, generation, diagnostics)
            .await;
    }

    async fn publish_if_current(
        &self,
        document: &TextDocument,
        generation: u64,
        mut diagnostics: Vec<Diagnostic>,
    ) -> bool {
        if !self.is_current(document.uri(), generation) {
            debug!("Discarding diagnostics of a superseded pass over {}", document.uri());
            return false;
        }

        diagnostics.sort_by_key(|d| (d.range.start.line, d.range.start.character));
        debug!(
            "Publishing {} diagnostics for {}",
            diagnostics.len(),
            document.uri()
        );
        self.publisher
            .publish(document.uri().clone(), diagnostics)
            .await;
        true
    }
}

async fn evaluate_dependency(
    document: &TextDocument,
    ctx: &CollectionContext<'_>,
    rules: &[&dyn DiagnosticRule],
    dependency: DependencyInfo,
) -> Vec<Diagnostic> {
    let dependency = ctx.resolver.resolve(document.uri(), dependency).await;

    let Some(package) = ctx.store.package_info(&dependency.name).await else {
        debug!("No package information for {}, skipping", dependency.name);
        return Vec::new();
    };

    let parsed = effective_parsed(&dependency);
    let exact = exact_version(parsed.as_ref());

    let (replacement, advisories) = tokio::join!(
        async {
            if ctx.config.replacement {
                ctx.store.replacement(&dependency.name).await
            } else {
                None
            }
        },
        async {
            match exact {
                Some(version) if ctx.config.vulnerability => {
                    ctx.store.advisories(&dependency.name, version).await
                }
                _ => None,
            }
        }
    );

    let rule_ctx = RuleContext {
        dependency: &dependency,
        parsed: parsed.as_ref(),
        package: &package,
        replacement: replacement.as_ref(),
        advisories: advisories.as_deref().map(Vec::as_slice).unwrap_or_default(),
    };

    rules
        .iter()
        .filter_map(|rule| rule.check(&rule_ctx))
        .map(|found| to_lsp_diagnostic(document, ctx.extractor, &dependency, found))
        .collect()
}

fn to_lsp_diagnostic(
    document: &TextDocument,
    extractor: &dyn Extractor,
    dependency: &DependencyInfo,
    found: NodeDiagnostic,
) -> Diagnostic {
    let code_description = found
        .code_href
        .as_deref()
        .and_then(|href| Url::parse(href).ok())
        .map(|href| CodeDescription { href });

    // Version findings of a catalog reference point back at the catalog entry
    let related_information = dependency
        .catalog_resolution
        .as_ref()
        .filter(|_| found.node == dependency.version_node)
        .map(|resolution| {
            vec![DiagnosticRelatedInformation {
                location: resolution.entry_location.clone(),
                message: format!(
                    "{CATALOG_RELATED_INFO_PREFIX}{}/{}",
                    resolution.catalog_name, dependency.name
                ),
            }]
        });

    Diagnostic {
        range: extractor.node_range(document, &found.node),
        severity: Some(found.severity),
        code: found.code.map(NumberOrString::String),
        code_description,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: found.message,
        related_information,
        tags: found.tags,
        data: found.data,
    }
}
