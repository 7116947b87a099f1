use std::process::ExitCode;

use clap::Parser;
use pocketbook::{AppContext, Result};

mod cli;
mod commands;
mod render;

#[tokio::main]
async fn main() -> ExitCode {
    match run(cli::Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: cli::Cli) -> Result<()> {
    let settings = pocketbook::config::load(cli.overrides())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("pocketbook={level}", level = settings.log_level))
        .with_writer(std::io::stderr)
        .init();

    let ctx = AppContext::new(settings)?;
    tracing::debug!(base_url = ctx.api.base_url(), "context ready");

    let result = commands::run(&ctx, cli.command).await;
    // Pending toasts go to stderr once the command ends.
    render::toasts(&ctx.toasts.drain());
    result
}
