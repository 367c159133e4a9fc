//! `mkit completions` - print a shell completion script for mkit.

use anyhow::Result;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::Generator;
use clap_complete_nushell::Nushell;
use std::io::{self, Write};

use crate::cli::Cli;

/// Shells mkit can generate completions for.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Nushell,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn write_script(generator: impl Generator, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(generator, &mut cmd, name, out);
}

/// Write the completion script for `shell` to `out`.
pub fn generate(shell: Shell, out: &mut dyn Write) {
    match shell {
        Shell::Bash => write_script(clap_complete::Shell::Bash, out),
        Shell::Zsh => write_script(clap_complete::Shell::Zsh, out),
        Shell::Fish => write_script(clap_complete::Shell::Fish, out),
        Shell::Nushell => write_script(Nushell, out),
    }
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    generate(args.shell, &mut io::stdout());
    Ok(())
}
