//! Custom error types for mkit.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, updating or writing a Kitfile.
#[derive(Error, Debug)]
pub enum KitfileError {
    #[error("Kitfile not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid Kitfile {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Kitfile {} is not a YAML mapping", path.display())]
    NotAMapping { path: PathBuf },

    #[error("Failed to serialize Kitfile: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Kitfile section '{section}' is not a {expected}")]
    SectionShape {
        section: String,
        expected: &'static str,
    },

    #[error("Kitfile is missing '{field}'")]
    MissingField { field: String },
}

/// Errors raised while running the `kit` CLI.
#[derive(Error, Debug)]
pub enum KitError {
    #[error("Failed to start '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("'{command}' exited with {}", describe_exit(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Invalid ModelKit reference '{0}': expected <registry>/<namespace>/<name>:<tag>")]
    InvalidReference(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
