use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use crate::config::{LspConfig, NPMX_DEV, VERSION_TRIGGER_CHARACTERS};
use crate::links::npmx_file_url;
use crate::lsp::code_action::upgrade_actions;
use crate::lsp::code_lens::{code_lenses, resolve_code_lens};
use crate::lsp::commands::{
    CLEAR_CACHES, COMMANDS, LeadingDebounce, OPEN_FILE_IN_NPMX, OPEN_IN_BROWSER, OPEN_LOCATION,
    OpenFileArgs, OpenLocationArgs, UPDATE_VERSION, UpdateVersionArgs,
};
use crate::lsp::completion::completion_items;
use crate::lsp::diagnostics::{CollectionContext, DiagnosticsEngine};
use crate::lsp::document_link::document_links;
use crate::lsp::hover::hover;
use crate::lsp::resolver::DependencyResolver;
use crate::parser::document::TextDocument;
use crate::parser::extractors::Extractors;
use crate::version::store::PackageStore;
use crate::workspace::fs::{FileSystem, LocalFileSystem};
use crate::workspace::installed::{InstalledFileError, resolve_installed_file};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State shared by request handlers and spawned collection passes
struct ServerState {
    documents: RwLock<HashMap<Url, Arc<TextDocument>>>,
    config: RwLock<LspConfig>,
    extractors: Extractors,
    store: RwLock<Arc<PackageStore>>,
    /// An injected store keeps its data sources across registry reconfiguration
    store_injected: bool,
    fs: Arc<dyn FileSystem>,
    resolver: DependencyResolver,
    diagnostics: DiagnosticsEngine,
    update_debounce: LeadingDebounce,
}

impl ServerState {
    fn document(&self, uri: &Url) -> Option<Arc<TextDocument>> {
        read(&self.documents).get(uri).cloned()
    }

    fn store(&self) -> Arc<PackageStore> {
        Arc::clone(&read(&self.store))
    }

    fn config(&self) -> LspConfig {
        read(&self.config).clone()
    }

    fn apply_config(&self, config: LspConfig) {
        let previous = std::mem::replace(&mut *write(&self.config), config.clone());

        if previous.registry != config.registry && !self.store_injected {
            info!("Registry endpoints changed, starting with empty caches");
            *write(&self.store) = Arc::new(PackageStore::with_endpoints(
                &config.registry,
                &config.cache,
            ));
        } else if previous.cache != config.cache {
            self.store().configure(&config.cache);
        }
    }

    async fn collect_diagnostics(&self, document: Arc<TextDocument>, generation: u64) {
        let Some(extractor) = self.extractors.for_uri(document.uri()) else {
            return;
        };
        let store = self.store();
        let config = self.config();

        self.diagnostics
            .collect_tracked(
                &document,
                generation,
                &CollectionContext {
                    extractor,
                    store: &store,
                    resolver: &self.resolver,
                    config: &config.diagnostics,
                },
            )
            .await;
    }
}

pub struct Backend {
    client: Client,
    state: Arc<ServerState>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        let config = LspConfig::default();
        let store = Arc::new(PackageStore::with_endpoints(&config.registry, &config.cache));
        Self::with_parts(client, store, false, Arc::new(LocalFileSystem))
    }

    /// Build a Backend with custom data sources and file system
    pub fn build(client: Client, store: Arc<PackageStore>, fs: Arc<dyn FileSystem>) -> Self {
        Self::with_parts(client, store, true, fs)
    }

    fn with_parts(
        client: Client,
        store: Arc<PackageStore>,
        store_injected: bool,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let state = ServerState {
            documents: RwLock::new(HashMap::new()),
            config: RwLock::new(LspConfig::default()),
            extractors: Extractors::new(),
            store: RwLock::new(store),
            store_injected,
            resolver: DependencyResolver::new(Arc::clone(&fs)),
            fs,
            diagnostics: DiagnosticsEngine::new(client.clone()),
            update_debounce: LeadingDebounce::default(),
        };

        Self {
            client,
            state: Arc::new(state),
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    ..Default::default()
                },
            )),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(
                    VERSION_TRIGGER_CHARACTERS
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                ),
                ..Default::default()
            }),
            code_lens_provider: Some(CodeLensOptions {
                resolve_provider: Some(true),
            }),
            code_action_provider: Some(CodeActionProviderCapability::Options(
                CodeActionOptions {
                    code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                    ..Default::default()
                },
            )),
            document_link_provider: Some(DocumentLinkOptions {
                resolve_provider: Some(false),
                work_done_progress_options: Default::default(),
            }),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Store `document` and start a collection pass for it in the background
    fn open_revision(&self, document: TextDocument) {
        if self.state.extractors.for_uri(document.uri()).is_none() {
            debug!("Ignoring unsupported document {}", document.uri());
            return;
        }

        let document = Arc::new(document);
        write(&self.state.documents).insert(document.uri().clone(), Arc::clone(&document));
        self.spawn_collection(document);
    }

    /// Supersede any running pass over `document` and start a new one
    fn spawn_collection(&self, document: Arc<TextDocument>) {
        let generation = self.state.diagnostics.track(&document);

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.collect_diagnostics(document, generation).await;
        });
    }

    fn recollect_all(&self) {
        let documents: Vec<_> = read(&self.state.documents).values().cloned().collect();
        for document in documents {
            self.spawn_collection(document);
        }
    }

    async fn update_version(&self, arguments: &[Value]) -> Result<Option<Value>> {
        if !self.state.update_debounce.try_acquire() {
            debug!("Dropping repeated {} invocation", UPDATE_VERSION);
            return Ok(None);
        }

        let Some(args) = UpdateVersionArgs::from_arguments(arguments) else {
            warn!("Invalid arguments for {}: {:?}", UPDATE_VERSION, arguments);
            return Ok(None);
        };

        let mut changes = HashMap::new();
        changes.insert(
            args.uri.clone(),
            vec![TextEdit {
                range: args.range,
                new_text: args.new_text,
            }],
        );

        match self
            .client
            .apply_edit(WorkspaceEdit {
                changes: Some(changes),
                ..Default::default()
            })
            .await
        {
            Ok(response) if !response.applied => warn!(
                "Client rejected version edit of {}: {:?}",
                args.uri, response.failure_reason
            ),
            Ok(_) => {}
            Err(e) => error!("Failed to apply version edit of {}: {}", args.uri, e),
        }

        if let Err(e) = self.client.code_lens_refresh().await {
            debug!("Code lens refresh failed: {}", e);
        }
        Ok(None)
    }

    async fn open_location(&self, arguments: &[Value]) -> Result<Option<Value>> {
        let Some(args) = OpenLocationArgs::from_arguments(arguments) else {
            warn!("Invalid arguments for {}: {:?}", OPEN_LOCATION, arguments);
            return Ok(None);
        };

        let params = ShowDocumentParams {
            uri: args.uri,
            external: Some(false),
            take_focus: Some(true),
            selection: Some(args.range),
        };
        if let Err(e) = self.client.show_document(params).await {
            error!("Failed to show document: {}", e);
        }
        Ok(None)
    }

    /// Ask the client to open `url` in the system browser
    async fn open_external(&self, url: &str) {
        let Ok(uri) = Url::parse(url) else {
            warn!("Refusing to open invalid URL {}", url);
            return;
        };

        let params = ShowDocumentParams {
            uri,
            external: Some(true),
            take_focus: None,
            selection: None,
        };
        if let Err(e) = self.client.show_document(params).await {
            error!("Failed to open {}: {}", url, e);
        }
    }

    async fn open_file_in_npmx(&self, arguments: &[Value]) -> Result<Option<Value>> {
        let Some(args) = OpenFileArgs::from_arguments(arguments) else {
            self.client
                .show_message(MessageType::ERROR, "npmx: No active file selected.")
                .await;
            return Ok(None);
        };
        let Ok(path) = args.uri.to_file_path() else {
            self.client
                .show_message(MessageType::ERROR, "npmx: Selected file is not a local file.")
                .await;
            return Ok(None);
        };

        match resolve_installed_file(self.state.fs.as_ref(), &path).await {
            Ok(file) => {
                let url = npmx_file_url(&file.name, &file.version, &file.relative_path, args.lines());
                self.open_external(&url).await;
            }
            Err(e @ InstalledFileError::NotInNodeModules) => {
                self.client
                    .show_message(MessageType::ERROR, format!("npmx: {e}"))
                    .await;
            }
            Err(e) => {
                warn!("Could not resolve npmx url: {}", args.uri);
                self.client
                    .show_message(MessageType::WARNING, format!("npmx: {e}"))
                    .await;
            }
        }
        Ok(None)
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;

        if let Some(options) = params.initialization_options.as_ref() {
            self.state.apply_config(LspConfig::from_settings(options));
        }

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "npmx-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!("Document opened: {}", params.text_document.uri);

        let item = params.text_document;
        self.open_revision(TextDocument::new(item.uri, item.version, item.text));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // With FULL sync mode, the last content change contains the full document text
        let Some(content) = params.content_changes.into_iter().last().map(|c| c.text) else {
            return;
        };

        debug!("Document changed: {}", params.text_document.uri);

        self.open_revision(TextDocument::new(
            params.text_document.uri,
            params.text_document.version,
            content,
        ));
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document closed: {}", uri);

        if write(&self.state.documents).remove(&uri).is_none() {
            return;
        }
        self.state.extractors.invalidate(&uri);
        self.state.diagnostics.forget(&uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        info!("Configuration changed");
        self.state
            .apply_config(LspConfig::from_settings(&params.settings));
        self.recollect_all();
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        if !self.state.config().hover.enabled {
            return Ok(None);
        }

        let position = params.text_document_position_params;
        let Some(document) = self.state.document(&position.text_document.uri) else {
            return Ok(None);
        };
        let Some(extractor) = self.state.extractors.for_uri(document.uri()) else {
            return Ok(None);
        };

        Ok(hover(
            &document,
            position.position,
            extractor,
            &self.state.store(),
            &self.state.resolver,
        )
        .await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let Some(document) = self.state.document(&position.text_document.uri) else {
            return Ok(None);
        };
        let Some(extractor) = self.state.extractors.for_uri(document.uri()) else {
            return Ok(None);
        };

        let items = completion_items(
            &document,
            position.position,
            extractor,
            &self.state.store(),
            &self.state.config().completion,
        )
        .await;

        Ok(items.map(CompletionResponse::Array))
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        if !self.state.config().code_lens.enabled {
            return Ok(None);
        }

        let Some(document) = self.state.document(&params.text_document.uri) else {
            return Ok(None);
        };
        let Some(extractor) = self.state.extractors.for_uri(document.uri()) else {
            return Ok(None);
        };

        Ok(Some(code_lenses(&document, extractor)))
    }

    async fn code_lens_resolve(&self, params: CodeLens) -> Result<CodeLens> {
        Ok(resolve_code_lens(params, &self.state.store()).await)
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let actions = upgrade_actions(&params.text_document.uri, &params.context.diagnostics);

        Ok((!actions.is_empty()).then_some(actions))
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        if !self.state.config().document_link.enabled {
            return Ok(None);
        }

        let Some(document) = self.state.document(&params.text_document.uri) else {
            return Ok(None);
        };
        let Some(extractor) = self.state.extractors.for_uri(document.uri()) else {
            return Ok(None);
        };

        Ok(Some(document_links(&document, extractor)))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        match params.command.as_str() {
            UPDATE_VERSION => self.update_version(&params.arguments).await,
            OPEN_LOCATION => self.open_location(&params.arguments).await,
            OPEN_FILE_IN_NPMX => self.open_file_in_npmx(&params.arguments).await,
            OPEN_IN_BROWSER => {
                self.open_external(NPMX_DEV).await;
                Ok(None)
            }
            CLEAR_CACHES => {
                info!("Clearing all caches");
                self.state.store().clear();
                self.state.extractors.clear_caches();
                Ok(None)
            }
            other => Err(Error::invalid_params(format!("Unknown command: {other}"))),
        }
    }
}
