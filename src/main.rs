use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "npmx-lsp")]
#[command(version, about = "Language Server for npm dependency intelligence")]
struct Cli {
    /// Log filter directive (e.g. "debug", "npmx_lsp=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the log file location and exit
    LogPath,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::LogPath) => {
            println!("{}", npmx_lsp::config::log_path().display());
            Ok(())
        }
        None => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(npmx_lsp::lsp::server::run_server(cli.log_level)),
    }
}
