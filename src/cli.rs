use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "branchdiff",
    about = "Two-column branch diff summaries for coding agents",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the diff against the base branch
    #[command(alias = "r")]
    Render {
        /// Compare against this branch instead of the detected base
        #[arg(long)]
        base: Option<String>,

        /// Report width in columns (overrides config)
        #[arg(long)]
        width: Option<usize>,

        /// Write output to file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the detected base branch
    Base,

    /// Write a default config file to the repository root
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}
