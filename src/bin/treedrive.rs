//! Treedrive CLI Binary
//!
//! Command-line interface for per-owner tree stores.

use anyhow::Context;
use clap::Parser;
use std::process;
use treedrive::logging::init_logging;
use treedrive::tooling::cli::{Cli, CliContext};

fn run(cli: Cli) -> anyhow::Result<String> {
    let mut config = CliContext::load_config(cli.config.as_deref(), cli.store)
        .context("Error loading configuration")?;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(output) = cli.log_output {
        config.logging.output = output;
    }
    if let Some(file) = cli.log_file {
        config.logging.file = Some(file);
    }
    init_logging(Some(&config.logging)).context("Error initializing logging")?;

    let context = CliContext::with_config(config, cli.user, cli.owner)
        .context("Error initializing store")?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
