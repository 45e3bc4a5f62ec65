use anyhow::Context;
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{data_dir, log_path};
use crate::lsp::backend::Backend;

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "NPMX_LSP_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

fn env_filter(log_level: Option<String>) -> EnvFilter {
    log_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Serve LSP over stdio until the client disconnects.
///
/// Logs go to a JSON-lines file in the data directory; stdout carries JSON-RPC only.
pub async fn run_server(log_level: Option<String>) -> anyhow::Result<()> {
    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&data_dir, "npmx-lsp.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(env_filter(log_level))
        .init();

    info!("Starting npmx-lsp, logging to {}", log_path().display());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("npmx-lsp stopped");
    Ok(())
}
