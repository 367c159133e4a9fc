//! Execution plan shared by every command.
//!
//! Resolves the global options once: which directory is the project, which
//! Kitfile to touch, which `kit` binary to run, and whether this is a dry run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::Cli;
use crate::command_runner::{CommandRunner, RealCommandRunner};
use crate::kit::{DEFAULT_PROGRAM, Kit};
use crate::manifest::{KITFILE_NAME, KitfileStore};

/// Execution plan for an mkit command.
#[derive(Clone)]
pub struct ExecutionPlan {
    /// Directory `kit` runs in
    pub project_dir: PathBuf,
    /// Kitfile path
    pub kitfile: PathBuf,
    /// `kit` executable
    pub kit_bin: String,
    /// Whether to perform a dry run
    pub dry_run: bool,
    /// Whether to print the Kitfile after loads and saves
    pub echo: bool,
    runner: Arc<dyn CommandRunner>,
}

impl ExecutionPlan {
    /// Create an execution plan from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_dir = match &cli.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        let kitfile = cli
            .kitfile
            .clone()
            .unwrap_or_else(|| project_dir.join(KITFILE_NAME));

        Ok(Self {
            project_dir,
            kitfile,
            kit_bin: cli.kit_bin.clone(),
            dry_run: cli.dry_run,
            echo: !cli.quiet,
            runner: Arc::new(RealCommandRunner),
        })
    }

    /// Plan rooted at `project_dir` with default settings.
    pub fn for_project(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = project_dir.as_ref().to_path_buf();
        Self {
            kitfile: project_dir.join(KITFILE_NAME),
            project_dir,
            kit_bin: DEFAULT_PROGRAM.to_string(),
            dry_run: false,
            echo: false,
            runner: Arc::new(RealCommandRunner),
        }
    }

    /// Replace the command runner (used by tests).
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The Kitfile store for this plan.
    ///
    /// The template is always looked up under the project directory.
    pub fn kitfile_store(&self) -> KitfileStore {
        KitfileStore::new(&self.project_dir)
            .with_manifest_path(&self.kitfile)
            .with_echo(self.echo)
            .with_dry_run(self.dry_run)
    }

    /// The `kit` handle for this plan.
    pub fn kit(&self) -> Kit {
        Kit::new(self.runner.clone())
            .with_program(&self.kit_bin)
            .with_working_dir(&self.project_dir)
            .with_dry_run(self.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli_defaults_kitfile_to_project_dir() {
        let cli = Cli::parse_from(["mkit", "-C", "/proj", "kitfile", "show"]);
        let plan = ExecutionPlan::from_cli(&cli).unwrap();
        assert_eq!(plan.project_dir, PathBuf::from("/proj"));
        assert_eq!(plan.kitfile, PathBuf::from("/proj/Kitfile"));
        assert!(plan.echo);
        assert!(!plan.dry_run);
    }

    #[test]
    fn test_from_cli_explicit_kitfile() {
        let cli = Cli::parse_from([
            "mkit",
            "--kitfile",
            "/elsewhere/Kitfile",
            "-q",
            "kitfile",
            "show",
        ]);
        let plan = ExecutionPlan::from_cli(&cli).unwrap();
        assert_eq!(plan.kitfile, PathBuf::from("/elsewhere/Kitfile"));
        let store = plan.kitfile_store();
        assert_eq!(store.manifest_path(), Path::new("/elsewhere/Kitfile"));
        assert!(store.template_path().starts_with(&plan.project_dir));
        assert!(!plan.echo);
    }
}
