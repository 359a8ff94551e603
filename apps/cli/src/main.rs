use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use client_core::{ChatClient, FileSessionStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod attachments;
mod commands;
mod config;

use commands::Command;
use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "slackr", about = "Terminal client for a slackr chat server")]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    session_path: Option<PathBuf>,
    #[arg(long, default_value = config::CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config).with_flags(cli.server_url, cli.session_path);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server_url = settings.validated_server_url()?;
    let session_file = settings.session_file()?;
    info!(%server_url, session = %session_file.display(), "starting slackr");

    let store = Arc::new(FileSessionStore::new(session_file));
    let client = ChatClient::new(server_url.as_str(), store)?;

    Ok(if commands::run_once(&client, cli.command).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
