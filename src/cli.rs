//! CLI argument definitions for mkit.
//!
//! This module contains the clap-derived `Cli` and `Commands` types.
//! Separated from `main.rs` so that library code (e.g., `pipeline::ExecutionPlan::from_cli`)
//! and shell completion generation can reference these types.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;
use crate::kit::DEFAULT_PROGRAM;

#[derive(Debug, Parser)]
#[command(name = "mkit")]
#[command(about = "mkit - manage Kitfiles and ModelKits for ML projects")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project directory holding the Kitfile (default: current directory)
    ///
    /// `kit pack .` and `kit unpack` also run from this directory.
    #[arg(short = 'C', long, env = "MKIT_PROJECT_DIR", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Kitfile to read and write (default: <project-dir>/Kitfile)
    #[arg(long, env = "MKIT_KITFILE", global = true)]
    pub kitfile: Option<PathBuf>,

    /// The kit executable to invoke
    #[arg(long, env = "MKIT_KIT_BIN", default_value = DEFAULT_PROGRAM, global = true)]
    pub kit_bin: String,

    /// Show what would be done without making changes
    #[arg(long, short = 'n', global = true)]
    pub dry_run: bool,

    /// Don't print the Kitfile after loading or saving it
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect and update the project's Kitfile
    #[command(alias = "kf")]
    Kitfile(commands::kitfile::KitfileArgs),

    /// Log in to a registry and pack, push or unpack ModelKits
    #[command(alias = "mk")]
    Modelkit(commands::modelkit::ModelkitArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}
