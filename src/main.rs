mod cli;
mod commands;
mod mcp;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pdfdesk::pdf::images::ImagePdfOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(inputs.as_slice(), &output)?;
        }
        Commands::Images {
            inputs,
            output,
            dpi,
        } => {
            commands::images::run(inputs.as_slice(), &output, &ImagePdfOptions { dpi })?;
        }
        Commands::Delete {
            path,
            pages,
            output,
        } => {
            commands::delete::run(&path, &pages, output.as_deref())?;
        }
        Commands::Extract {
            path,
            pages,
            output,
        } => {
            commands::extract::run(&path, &pages, &output)?;
        }
        Commands::Pages { spec, total } => {
            commands::pages::run(&spec, total)?;
        }
    }

    Ok(())
}

/// Logs go to stderr: stdout carries command output and the MCP protocol.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pdfdesk=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
