//! Hover, completion, code lens, document link and command E2E tests

mod helper;

use std::fs;
use std::sync::Arc;

use serde_json::{Value, json};
use tower_lsp::LspService;
use tower_lsp::jsonrpc::Request;
use tower_lsp::lsp_types::*;

use helper::{
    MockRegistry, call_request, create_code_action_request, create_completion_request,
    create_did_open_notification, create_execute_command_request, create_hover_request,
    create_initialize_request_with_options, create_initialized_notification, create_test_store,
    initialize, notify, spawn_client, spawn_notification_collector, wait_for_diagnostics,
    wait_for_notification,
};
use npmx_lsp::lsp::backend::Backend;
use npmx_lsp::workspace::LocalFileSystem;

const URI: &str = "file:///project/package.json";

const MANIFEST: &str = r#"{
  "dependencies": {
    "lodash": "^4.17.0",
    "local": "workspace:*"
  }
}
"#;

fn registry() -> MockRegistry {
    MockRegistry::new().with_package(
        "lodash",
        &[("latest", "4.17.21"), ("next", "5.0.0-rc.1")],
        &[
            ("4.16.0", Some("outdated")),
            ("4.17.0", None),
            ("4.17.21", None),
            ("5.0.0-rc.1", None),
        ],
    )
}

fn text_document_request(method: &str, id: i64) -> Request {
    Request::build(method.to_string())
        .id(id)
        .params(json!({ "textDocument": { "uri": URI } }))
        .finish()
}

#[tokio::test(flavor = "multi_thread")]
async fn hover_and_completion_on_dependency() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let _notification_rx = spawn_notification_collector(socket);
    initialize(&mut service).await;
    notify(&mut service, create_did_open_notification(URI, MANIFEST)).await;

    let hover: Hover =
        serde_json::from_value(call_request(&mut service, create_hover_request(2, URI, 2, 8)).await)
            .unwrap();
    let HoverContents::Markup(markup) = hover.contents else {
        panic!("expected markdown hover");
    };
    assert_eq!(
        markup.value,
        "[View on npmx.dev](https://npmx.dev/package/lodash) | [View docs on npmx.dev](https://npmx.dev/docs/lodash/v/4.17.0)"
    );

    let completion: CompletionResponse = serde_json::from_value(
        call_request(&mut service, create_completion_request(3, URI, 2, 18)).await,
    )
    .unwrap();
    let CompletionResponse::Array(items) = completion else {
        panic!("expected a completion array");
    };
    let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
    assert_eq!(labels, vec!["^4.17.0", "^4.17.21"]);

    // workspace references are not registry-backed
    let completion = call_request(&mut service, create_completion_request(4, URI, 3, 16)).await;
    assert_eq!(completion, Value::Null);
}

#[tokio::test(flavor = "multi_thread")]
async fn code_lens_resolves_update_command() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let _notification_rx = spawn_notification_collector(socket);
    call_request(
        &mut service,
        create_initialize_request_with_options(1, json!({ "codeLens": { "enabled": true } })),
    )
    .await;
    notify(&mut service, create_initialized_notification()).await;
    notify(&mut service, create_did_open_notification(URI, MANIFEST)).await;

    let lenses: Vec<CodeLens> = serde_json::from_value(
        call_request(&mut service, text_document_request("textDocument/codeLens", 2)).await,
    )
    .unwrap();
    assert_eq!(lenses.len(), 1);
    assert!(lenses[0].command.is_none());

    let resolved: CodeLens = serde_json::from_value(
        call_request(
            &mut service,
            Request::build("codeLens/resolve")
                .id(3)
                .params(serde_json::to_value(&lenses[0]).unwrap())
                .finish(),
        )
        .await,
    )
    .unwrap();
    let command = resolved.command.unwrap();
    assert_eq!(command.title, "⬆ ^4.17.21 (patch)");
    assert_eq!(command.command, "npmx.updateVersion");
    assert_eq!(
        command.arguments.unwrap(),
        vec![json!(URI), json!(lenses[0].range), json!("^4.17.21")]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn code_lens_is_disabled_by_default() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let _notification_rx = spawn_notification_collector(socket);
    initialize(&mut service).await;
    notify(&mut service, create_did_open_notification(URI, MANIFEST)).await;

    let lenses = call_request(&mut service, text_document_request("textDocument/codeLens", 2)).await;

    assert_eq!(lenses, Value::Null);
}

#[tokio::test(flavor = "multi_thread")]
async fn document_links_point_at_package_pages() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let _notification_rx = spawn_notification_collector(socket);
    initialize(&mut service).await;
    notify(&mut service, create_did_open_notification(URI, MANIFEST)).await;

    let links: Vec<DocumentLink> = serde_json::from_value(
        call_request(&mut service, text_document_request("textDocument/documentLink", 2)).await,
    )
    .unwrap();

    let targets: Vec<_> = links
        .iter()
        .map(|link| link.target.as_ref().unwrap().as_str())
        .collect();
    assert_eq!(
        targets,
        vec![
            "https://npmx.dev/package/lodash",
            "https://npmx.dev/package/local"
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn upgrade_diagnostic_offers_quick_fix() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let mut notification_rx = spawn_notification_collector(socket);
    initialize(&mut service).await;
    notify(&mut service, create_did_open_notification(URI, MANIFEST)).await;
    let params = wait_for_diagnostics(&mut notification_rx, URI).await;

    let actions: Vec<CodeActionOrCommand> = serde_json::from_value(
        call_request(
            &mut service,
            create_code_action_request(2, URI, params.diagnostics.clone()),
        )
        .await,
    )
    .unwrap();

    assert_eq!(actions.len(), 1);
    let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
        panic!("expected a code action");
    };
    assert_eq!(action.title, "Update to ^4.17.21");
    let edits = action
        .edit
        .as_ref()
        .unwrap()
        .changes
        .as_ref()
        .unwrap()
        .get(&Url::parse(URI).unwrap())
        .unwrap();
    assert_eq!(edits[0].range, params.diagnostics[0].range);
    assert_eq!(edits[0].new_text, "^4.17.21");
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_caches_command_succeeds_and_unknown_command_fails() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let _notification_rx = spawn_notification_collector(socket);
    initialize(&mut service).await;

    let result = call_request(
        &mut service,
        create_execute_command_request(2, "npmx.clearCaches", vec![]),
    )
    .await;
    assert_eq!(result, Value::Null);

    let response = tower::Service::call(
        &mut service,
        create_execute_command_request(3, "npmx.unknown", vec![]),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(response.is_error());
}

#[tokio::test(flavor = "multi_thread")]
async fn open_in_browser_shows_npmx_externally() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let mut client_rx = spawn_client(socket, json!({ "success": true }));
    initialize(&mut service).await;

    let result = call_request(
        &mut service,
        create_execute_command_request(2, "npmx.openInBrowser", vec![]),
    )
    .await;
    assert_eq!(result, Value::Null);

    let request = wait_for_notification(&mut client_rx, "window/showDocument")
        .await
        .unwrap();
    let params: ShowDocumentParams =
        serde_json::from_value(request.params().unwrap().clone()).unwrap();
    assert_eq!(params.uri.as_str(), "https://npmx.dev/");
    assert_eq!(params.external, Some(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn open_file_in_npmx_opens_source_view_at_selection() {
    let project = tempfile::TempDir::new().unwrap();
    let package_dir = project.path().join("node_modules/lodash");
    fs::create_dir_all(package_dir.join("fp")).unwrap();
    fs::write(
        package_dir.join("package.json"),
        r#"{"name": "lodash", "version": "4.17.21"}"#,
    )
    .unwrap();
    fs::write(package_dir.join("fp/map.js"), "").unwrap();
    let file_uri = Url::from_file_path(package_dir.join("fp/map.js")).unwrap();

    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let mut client_rx = spawn_client(socket, json!({ "success": true }));
    initialize(&mut service).await;

    call_request(
        &mut service,
        create_execute_command_request(
            2,
            "npmx.openFileInNpmx",
            vec![
                json!(file_uri),
                json!(Range::new(Position::new(9, 0), Position::new(14, 2))),
            ],
        ),
    )
    .await;

    let request = wait_for_notification(&mut client_rx, "window/showDocument")
        .await
        .unwrap();
    let params: ShowDocumentParams =
        serde_json::from_value(request.params().unwrap().clone()).unwrap();
    assert_eq!(
        params.uri.as_str(),
        "https://npmx.dev/package-code/lodash/v/4.17.21/fp/map.js#L10-L15"
    );
    assert_eq!(params.external, Some(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn open_file_in_npmx_rejects_files_outside_node_modules() {
    let store = create_test_store(registry());
    let (mut service, socket) =
        LspService::build(|client| Backend::build(client, store, Arc::new(LocalFileSystem))).finish();
    let mut client_rx = spawn_client(socket, Value::Null);
    initialize(&mut service).await;

    call_request(
        &mut service,
        create_execute_command_request(2, "npmx.openFileInNpmx", vec![json!(URI)]),
    )
    .await;

    let notification = wait_for_notification(&mut client_rx, "window/showMessage")
        .await
        .unwrap();
    let params: ShowMessageParams =
        serde_json::from_value(notification.params().unwrap().clone()).unwrap();
    assert_eq!(params.typ, MessageType::ERROR);
    assert_eq!(
        params.message,
        "npmx: Selected file is not within a node_modules folder."
    );
}
