//! Twinlink CLI Binary
//!
//! Command-line inspection of agent links and protocol bindings.

use anyhow::Context;
use clap::Parser;
use std::process;
use twinlink::logging::init_logging;
use twinlink::tooling::cli::{Cli, CliContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut context =
        CliContext::new(cli.config.as_deref()).context("Failed to load configuration")?;
    context.apply_log_overrides(&cli);
    init_logging(Some(&context.config().logging)).context("Failed to initialize logging")?;

    let output = context.execute(&cli.command).await?;
    println!("{}", output.text);
    if !output.success {
        process::exit(1);
    }
    Ok(())
}
