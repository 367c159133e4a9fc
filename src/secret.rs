//! Scoped secret handling for registry credentials.
//!
//! A [`Secret`] is redacted in `Debug` and `Display` output and its buffer is
//! zeroed when it is dropped.

use std::fmt;
use std::io::BufRead;

use anyhow::{Context, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string value, such as a registry password.
///
/// ```rust
/// use mkit::secret::Secret;
///
/// let password = Secret::new("hunter2".to_string());
/// assert_eq!(format!("{password}"), "[REDACTED]");
/// assert_eq!(password.expose(), "hunter2");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the secret value.
    ///
    /// Only call this at the point where the value is handed to its consumer.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Read a secret from the first line of `reader`, without the line ending.
    pub fn from_reader(mut reader: impl BufRead) -> Result<Self> {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .context("Failed to read secret from stdin")?;
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Self(line))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

/// Registry login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: Secret,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}
