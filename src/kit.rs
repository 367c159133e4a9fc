//! Wrapper around the external `kit` packaging CLI.
//!
//! [`Kit`] builds the fixed `kit` command lines (login, logout, pack, push,
//! unpack) and the two workflows that chain them. Every command is echoed
//! before it runs and blocks until the child exits. A non-zero exit status is
//! reported as [`KitError::CommandFailed`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::command_runner::{CommandOptions, CommandRunner, RealCommandRunner};
use crate::error::KitError;
use crate::output::Output;
use crate::secret::{Credentials, Secret};

/// Default `kit` executable.
pub const DEFAULT_PROGRAM: &str = "kit";
/// Default registry host.
pub const DEFAULT_REGISTRY: &str = "jozu.ml";
/// Repository name used for every ModelKit of this project.
pub const REPOSITORY: &str = "titanic-survivability";
/// Namespace of the published collated-data ModelKit.
pub const COLLATED_DATA_NAMESPACE: &str = "jozu-demos";
/// Tag of the published collated-data ModelKit.
pub const COLLATED_DATA_TAG: &str = "collated-data-v1";
/// Tag used when publishing without an explicit one.
pub const DEFAULT_TAG: &str = "latest";

/// A ModelKit reference: `<registry>/<namespace>/<repository>:<tag>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRef {
    pub registry: String,
    pub namespace: String,
    pub repository: String,
    pub tag: String,
}

impl BundleRef {
    /// Reference to this project's repository in `namespace` on `registry`.
    pub fn new(
        registry: impl Into<String>,
        namespace: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            namespace: namespace.into(),
            repository: REPOSITORY.to_string(),
            tag: tag.into(),
        }
    }

    /// The published collated-data ModelKit on the default registry.
    pub fn collated_data() -> Self {
        Self::new(DEFAULT_REGISTRY, COLLATED_DATA_NAMESPACE, COLLATED_DATA_TAG)
    }
}

impl fmt::Display for BundleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}",
            self.registry, self.namespace, self.repository, self.tag
        )
    }
}

impl FromStr for BundleRef {
    type Err = KitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KitError::InvalidReference(s.to_string());

        let (path, tag) = s.rsplit_once(':').ok_or_else(invalid)?;
        let mut parts = path.splitn(3, '/');
        let (Some(registry), Some(namespace), Some(repository)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if [registry, namespace, repository, tag].iter().any(|p| p.is_empty()) || tag.contains('/')
        {
            return Err(invalid());
        }

        Ok(Self {
            registry: registry.to_string(),
            namespace: namespace.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }
}

/// Handle on the `kit` CLI.
pub struct Kit {
    program: String,
    options: CommandOptions,
    runner: Arc<dyn CommandRunner>,
    dry_run: bool,
}

impl Default for Kit {
    fn default() -> Self {
        Self::new(Arc::new(RealCommandRunner))
    }
}

impl Kit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            options: CommandOptions::default(),
            runner,
            dry_run: false,
        }
    }

    /// Use a different `kit` executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run `kit` from `dir`. `pack .` and `unpack` operate on this directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = CommandOptions::with_cwd(dir);
        self
    }

    /// Echo commands instead of running them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// `kit login <registry> -u <user> --password-stdin`
    pub fn login(&self, user: &str, password: &Secret, registry: &str) -> Result<(), KitError> {
        self.run(
            &["login", registry, "-u", user, "--password-stdin"],
            Some(password),
        )
    }

    /// `kit logout <registry>`
    pub fn logout(&self, registry: &str) -> Result<(), KitError> {
        self.run(&["logout", registry], None)
    }

    /// `kit pack . -t <reference>`
    ///
    /// `reference` is passed to `kit` as is, e.g. `jozu.ml/acme/model:v1` or
    /// `localhost:5000/model:v1`.
    pub fn pack(&self, reference: &str) -> Result<(), KitError> {
        self.run(&["pack", ".", "-t", reference], None)
    }

    /// `kit push <reference>`
    pub fn push(&self, reference: &str) -> Result<(), KitError> {
        self.run(&["push", reference], None)
    }

    /// `kit unpack -o <reference>`
    pub fn unpack(&self, reference: &str) -> Result<(), KitError> {
        self.run(&["unpack", "-o", reference], None)
    }

    /// Log in, unpack the collated-data ModelKit, log out.
    ///
    /// Use [`BundleRef::collated_data`] for the published defaults.
    pub fn unpack_collated_data(
        &self,
        credentials: &Credentials,
        reference: &BundleRef,
    ) -> Result<(), KitError> {
        let target = reference.to_string();
        self.with_session(credentials, &reference.registry, || self.unpack(&target))
    }

    /// Log in, pack the working directory, push it, log out.
    pub fn pack_and_push(
        &self,
        credentials: &Credentials,
        reference: &BundleRef,
    ) -> Result<(), KitError> {
        let target = reference.to_string();
        self.with_session(credentials, &reference.registry, || {
            self.pack(&target)?;
            self.push(&target)
        })
    }

    /// Run `body` between a login and a logout.
    ///
    /// Logout runs even if `body` fails; the body's error wins.
    fn with_session(
        &self,
        credentials: &Credentials,
        registry: &str,
        body: impl FnOnce() -> Result<(), KitError>,
    ) -> Result<(), KitError> {
        self.login(&credentials.user, &credentials.password, registry)?;
        let result = body();
        let logout = self.logout(registry);
        match (result, logout) {
            (Err(e), Err(logout_err)) => {
                tracing::warn!(registry, error = %logout_err, "Logout after failure also failed");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), logout) => logout,
        }
    }

    fn run(&self, args: &[&str], stdin: Option<&Secret>) -> Result<(), KitError> {
        let command = self.display_command(args);
        if self.dry_run {
            Output::dry_run(format!("Would run: {command}"));
            return Ok(());
        }

        Output::running(&command);
        tracing::debug!(command = %command, cwd = ?self.options.cwd, "Spawning kit");

        let status = match stdin {
            Some(secret) => self.runner.run_status_with_stdin(
                &self.program,
                args,
                &self.options,
                secret.expose().as_bytes(),
            ),
            None => self.runner.run_status(&self.program, args, &self.options),
        }
        .map_err(|source| KitError::Spawn {
            command: command.clone(),
            source: source.into(),
        })?;

        if !status.success() {
            return Err(KitError::CommandFailed {
                command,
                code: status.code(),
            });
        }
        Ok(())
    }

    fn display_command(&self, args: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .map(|arg| shlex::try_quote(arg).map_or_else(|_| arg.to_string(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
