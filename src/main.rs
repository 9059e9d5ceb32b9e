use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use branchdiff::cli::{Cli, ColorMode, Command};
use branchdiff::commands;
use branchdiff::commands::base::BaseOptions;
use branchdiff::commands::init::{InitOptions, InitResult};
use branchdiff::commands::render::RenderCommandOptions;
use branchdiff::config::CONFIG_FILE_NAME;
use branchdiff::error::BranchDiffError;

fn main() {
    let cli = Cli::parse();

    // Configure color output
    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    // Init tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{} {err}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = resolve_root(cli.root)?;
    match cli.command {
        Command::Render { base, width, out } => {
            commands::render::run(RenderCommandOptions {
                root,
                config_path: cli.config,
                base,
                width,
                out,
                quiet: cli.quiet,
            })?;
        }
        Command::Base => {
            let base = commands::base::run(BaseOptions { root })?;
            println!("{base}");
        }
        Command::Init { force } => {
            let result = commands::init::run(InitOptions {
                root,
                config_path: cli.config,
                force,
            })?;
            if !cli.quiet {
                print_init_result(&result);
            }
        }
    }
    Ok(())
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, BranchDiffError> {
    match root {
        Some(p) => Ok(p),
        None => std::env::current_dir()
            .map_err(|e| BranchDiffError::io("getting current directory", e)),
    }
}

fn print_init_result(result: &InitResult) {
    let verb = if result.overwritten { "Overwrote" } else { "Created" };
    println!(
        "{} {verb} config at {}",
        "ok".green().bold(),
        result.config_path.display()
    );
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} to set terminalWidth",
        CONFIG_FILE_NAME.bold()
    );
    println!(
        "  2. Run {} on a feature branch",
        "branchdiff render".bold()
    );
}
