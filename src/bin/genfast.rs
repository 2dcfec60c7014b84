//! genfast CLI Binary
//!
//! Runs the go:generate directives of a workspace whose inputs or outputs
//! changed since their last successful run.

use anyhow::Context;
use clap::Parser;
use genfast::cli::{map_error, Cli, RunContext};
use genfast::config::ConfigLoader;
use genfast::error::RunError;
use genfast::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("genfast starting");

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Command failed: {:#}", e);
            match e.downcast_ref::<RunError>() {
                Some(run_error) => eprintln!("{}", map_error(run_error)),
                None => eprintln!("error: {:#}", e),
            }
            process::exit(1);
        }
    }
}

/// Execute the command; `Ok(false)` means it completed with failures.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())?;
    let output = context
        .execute(&cli.command)
        .with_context(|| format!("in workspace {}", context.workspace_root().display()))?;
    println!("{}", output.text);
    Ok(output.success)
}

/// Build logging configuration from the config file, then CLI flags.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(&cli.workspace),
    };
    let mut config = loaded.map(|c| c.logging).unwrap_or_default();

    if cli.quiet {
        config.level = "error".to_string();
    } else if cli.verbose == 1 {
        config.level = "info".to_string();
    } else if cli.verbose > 1 {
        config.level = "debug".to_string();
    }

    if let Some(level) = &cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.file = file.clone();
    } else if config.file.is_relative() {
        config.file = cli.workspace.join(&config.file);
    }

    config
}
