use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mkit::commands;
use mkit::output::Output;
use mkit::pipeline::ExecutionPlan;
use mkit::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing with RUST_LOG env filter
    // e.g., RUST_LOG=mkit=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let plan = ExecutionPlan::from_cli(&cli)?;

    tracing::debug!(
        project_dir = %plan.project_dir.display(),
        kitfile = %plan.kitfile.display(),
        kit_bin = %plan.kit_bin,
        dry_run = plan.dry_run,
        "Execution plan created"
    );

    let result = match cli.command {
        Commands::Kitfile(args) => commands::kitfile::run(args, &plan),
        Commands::Modelkit(args) => commands::modelkit::run(args, &plan),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(err) = result {
        Output::error(format!("{err:#}"));
        std::process::exit(1);
    }
    Ok(())
}
