//! Quick fixes for upgrade diagnostics

use std::collections::HashMap;

use serde_json::json;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Command, Diagnostic, Location, TextEdit, Url,
    WorkspaceEdit,
};

use crate::config::{CATALOG_RELATED_INFO_PREFIX, PNPM_WORKSPACE_BASENAME, UPGRADE_MESSAGE_PREFIX};
use crate::lsp::commands::OPEN_LOCATION;

/// Replacement text suggested by an upgrade diagnostic
fn upgrade_target(diagnostic: &Diagnostic) -> Option<String> {
    diagnostic
        .data
        .as_ref()
        .and_then(|data| data.get("target"))
        .and_then(|target| target.as_str())
        .or_else(|| diagnostic.message.strip_prefix(UPGRADE_MESSAGE_PREFIX))
        .map(str::to_string)
}

fn catalog_entry(diagnostic: &Diagnostic) -> Option<&Location> {
    diagnostic
        .related_information
        .as_ref()?
        .iter()
        .find(|info| info.message.starts_with(CATALOG_RELATED_INFO_PREFIX))
        .map(|info| &info.location)
}

fn replace_edit(uri: &Url, location: &Location, new_text: &str) -> WorkspaceEdit {
    let mut changes = HashMap::new();
    changes.insert(
        uri.clone(),
        vec![TextEdit {
            range: location.range,
            new_text: new_text.to_string(),
        }],
    );

    WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    }
}

fn open_command(title: &str, location: &Location) -> Command {
    Command {
        title: title.to_string(),
        command: OPEN_LOCATION.to_string(),
        arguments: Some(vec![json!(location.uri), json!(location.range)]),
    }
}

/// Code actions for the upgrade diagnostics among `diagnostics`
///
/// A catalog-resolved upgrade offers to open the catalog entry and to update
/// it in place; any other upgrade edits the specifier in `uri`.
pub fn upgrade_actions(uri: &Url, diagnostics: &[Diagnostic]) -> Vec<CodeActionOrCommand> {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.message.starts_with(UPGRADE_MESSAGE_PREFIX))
        .flat_map(|diagnostic| {
            let Some(target) = upgrade_target(diagnostic) else {
                return Vec::new();
            };

            let actions = match catalog_entry(diagnostic) {
                Some(entry) => {
                    let open_title = format!("Open catalog entry in {PNPM_WORKSPACE_BASENAME}");
                    let update_title = format!("Update catalog entry to {target}");
                    vec![
                        CodeAction {
                            title: open_title.clone(),
                            kind: Some(CodeActionKind::QUICKFIX),
                            diagnostics: Some(vec![diagnostic.clone()]),
                            command: Some(open_command(&open_title, entry)),
                            ..Default::default()
                        },
                        CodeAction {
                            edit: Some(replace_edit(&entry.uri, entry, &target)),
                            command: Some(open_command(&update_title, entry)),
                            title: update_title,
                            kind: Some(CodeActionKind::QUICKFIX),
                            diagnostics: Some(vec![diagnostic.clone()]),
                            ..Default::default()
                        },
                    ]
                }
                None => vec![CodeAction {
                    title: format!("Update to {target}"),
                    kind: Some(CodeActionKind::QUICKFIX),
                    diagnostics: Some(vec![diagnostic.clone()]),
                    edit: Some(replace_edit(
                        uri,
                        &Location::new(uri.clone(), diagnostic.range),
                        &target,
                    )),
                    is_preferred: Some(true),
                    ..Default::default()
                }],
            };

            actions
                .into_iter()
                .map(CodeActionOrCommand::CodeAction)
                .collect()
        })
        .collect()
}
