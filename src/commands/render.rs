//! Handler for the `branchdiff render` command.
//!
//! Loads the config, opens the repository and writes the report. A
//! directory that is not a repository still produces a report: the
//! one-line "Base branch not found" message.

use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use crate::config::{Config, ConfigBuilder};
use crate::error::Result;
use crate::git::GitCli;
use crate::output::{self, OutputOptions};
use crate::report::{self, ReportOptions};

/// All inputs needed to run the render command.
#[derive(Debug)]
pub struct RenderCommandOptions {
    /// Repository root directory.
    pub root: PathBuf,
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
    /// Base branch override.
    pub base: Option<String>,
    /// Width override.
    pub width: Option<usize>,
    /// Write output to this file path.
    pub out: Option<PathBuf>,
    /// Suppress non-essential output.
    pub quiet: bool,
}

/// Run the render command end-to-end.
pub fn run(options: RenderCommandOptions) -> Result<()> {
    let mut config = Config::load_or_default(&options.root, options.config_path.as_deref());
    if let Some(width) = options.width {
        config = ConfigBuilder::from_config(config)
            .with_terminal_width(width)
            .build()?;
    }
    debug!(width = config.terminal_width, "rendering report");

    let report_options = ReportOptions {
        terminal_width: config.terminal_width,
        base: options.base,
    };
    let text = match GitCli::open(&options.root) {
        Ok(git) => report::build_report(&git, &report_options)?,
        Err(err) if err.is_missing_base() => report::base_not_found_message(&err),
        Err(err) => return Err(err),
    };

    output::write_output(
        &text,
        &OutputOptions {
            out: options.out.clone(),
        },
    )?;

    if let Some(ref path) = options.out {
        if !options.quiet {
            eprintln!(
                "{} report written to {}",
                "ok:".green().bold(),
                path.display()
            );
        }
    }
    Ok(())
}
