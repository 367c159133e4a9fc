//! ModelKit command implementation.
//!
//! Thin wrappers over [`Kit`](crate::kit::Kit): each subcommand maps to one
//! `kit` invocation or to one of the login/…/logout workflows.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use crate::kit::{
    BundleRef, COLLATED_DATA_NAMESPACE, COLLATED_DATA_TAG, DEFAULT_REGISTRY, DEFAULT_TAG,
};
use crate::manifest::KitfileSource;
use crate::output::Output;
use crate::pipeline::ExecutionPlan;
use crate::secret::{Credentials, Secret};

/// Environment variable holding the registry password.
pub const PASSWORD_ENV: &str = "KIT_PASSWORD";

#[derive(Debug, Args)]
pub struct ModelkitArgs {
    #[command(subcommand)]
    pub action: ModelkitAction,
}

/// Registry credentials.
///
/// The password never appears on the command line: it is read from
/// `KIT_PASSWORD`, or from stdin with `--password-stdin`.
#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Registry user name
    #[arg(short, long, env = "KIT_USER")]
    pub user: String,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

impl AuthArgs {
    pub fn credentials(&self) -> Result<Credentials> {
        let password = if self.password_stdin {
            if io::stdin().is_terminal() {
                Output::hint("Reading password from stdin");
            }
            Secret::from_reader(io::stdin().lock())?
        } else {
            match std::env::var(PASSWORD_ENV) {
                Ok(value) => Secret::new(value),
                Err(_) => bail!("No password given: set {PASSWORD_ENV} or pass --password-stdin"),
            }
        };

        if password.is_empty() {
            bail!("Registry password is empty");
        }
        Ok(Credentials {
            user: self.user.clone(),
            password,
        })
    }
}

#[derive(Debug, Args)]
pub struct RegistryArgs {
    /// Registry host
    #[arg(short, long, env = "KIT_REGISTRY", default_value = DEFAULT_REGISTRY)]
    pub registry: String,
}

#[derive(Debug, Subcommand)]
pub enum ModelkitAction {
    /// Log in to a registry
    Login {
        #[command(flatten)]
        auth: AuthArgs,
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Log out of a registry
    Logout {
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Pack the project directory as a ModelKit
    Pack {
        /// Reference passed to kit, e.g. jozu.ml/acme/titanic-survivability:v1
        reference: String,
    },
    /// Push a packed ModelKit
    Push {
        /// Reference passed to kit, e.g. jozu.ml/acme/titanic-survivability:v1
        reference: String,
    },
    /// Unpack a ModelKit into the project directory
    Unpack {
        /// Reference passed to kit, e.g. jozu.ml/acme/titanic-survivability:v1
        reference: String,
    },
    /// Log in, unpack the collated Titanic data ModelKit, log out
    FetchData {
        #[command(flatten)]
        auth: AuthArgs,
        #[command(flatten)]
        registry: RegistryArgs,
        #[arg(long, default_value = COLLATED_DATA_NAMESPACE)]
        namespace: String,
        #[arg(short, long, default_value = COLLATED_DATA_TAG)]
        tag: String,
    },
    /// Log in, pack and push the project directory, log out
    Publish {
        #[command(flatten)]
        auth: AuthArgs,
        #[command(flatten)]
        registry: RegistryArgs,
        /// Namespace to push to
        #[arg(long, env = "KIT_NAMESPACE")]
        namespace: String,
        #[arg(short, long, default_value = DEFAULT_TAG)]
        tag: String,
        /// Record the push in the Kitfile's package description first
        #[arg(long)]
        record: bool,
    },
}

pub fn run(args: ModelkitArgs, plan: &ExecutionPlan) -> Result<()> {
    let kit = plan.kit();

    match args.action {
        ModelkitAction::Login { auth, registry } => {
            let credentials = auth.credentials()?;
            kit.login(&credentials.user, &credentials.password, &registry.registry)?;
            Output::success(format!(
                "Logged in to {} as {}",
                registry.registry, credentials.user
            ));
        }

        ModelkitAction::Logout { registry } => {
            kit.logout(&registry.registry)?;
            Output::success(format!("Logged out of {}", registry.registry));
        }

        ModelkitAction::Pack { reference } => {
            kit.pack(&reference)?;
            Output::success(format!("Packed {reference}"));
        }

        ModelkitAction::Push { reference } => {
            kit.push(&reference)?;
            Output::success(format!("Pushed {reference}"));
        }

        ModelkitAction::Unpack { reference } => {
            kit.unpack(&reference)?;
            Output::success(format!("Unpacked {reference}"));
        }

        ModelkitAction::FetchData {
            auth,
            registry,
            namespace,
            tag,
        } => {
            let credentials = auth.credentials()?;
            let reference = BundleRef::new(registry.registry, namespace, tag);
            kit.unpack_collated_data(&credentials, &reference)
                .with_context(|| format!("Failed to fetch {reference}"))?;
            Output::success(format!(
                "Unpacked {reference} into {}",
                plan.project_dir.display()
            ));
        }

        ModelkitAction::Publish {
            auth,
            registry,
            namespace,
            tag,
            record,
        } => {
            let credentials = auth.credentials()?;
            let reference = BundleRef::new(registry.registry, namespace, tag);
            publish(plan, &credentials, &reference, record)?;
            Output::success(format!("Published {reference}"));
        }
    }

    Ok(())
}

/// Optionally record the push in the Kitfile, then pack and push the project.
///
/// The Kitfile is updated first so the packed ModelKit carries the annotation.
pub fn publish(
    plan: &ExecutionPlan,
    credentials: &Credentials,
    reference: &BundleRef,
    record: bool,
) -> Result<()> {
    if record {
        let store = plan.kitfile_store();
        let mut kitfile = store.load(KitfileSource::Manifest)?;
        store.record_push(&mut kitfile, &reference.tag)?;
    }

    plan.kit()
        .pack_and_push(credentials, reference)
        .with_context(|| format!("Failed to publish {reference}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::testing::MockCommandRunner;
    use crate::manifest::KITFILE_NAME;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn plan_with(runner: &Arc<MockCommandRunner>, dir: &TempDir) -> ExecutionPlan {
        ExecutionPlan::for_project(dir.path()).with_runner(runner.clone())
    }

    fn modelkit(action: ModelkitAction) -> ModelkitArgs {
        ModelkitArgs { action }
    }

    #[test]
    fn test_pack_push_unpack_run_in_project_dir() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockCommandRunner::new());
        let plan = plan_with(&runner, &dir);
        let reference = "jozu.ml/acme/titanic-survivability:v1".to_string();

        run(
            modelkit(ModelkitAction::Pack {
                reference: reference.clone(),
            }),
            &plan,
        )
        .unwrap();
        run(
            modelkit(ModelkitAction::Push {
                reference: reference.clone(),
            }),
            &plan,
        )
        .unwrap();
        run(modelkit(ModelkitAction::Unpack { reference }), &plan).unwrap();

        assert_eq!(
            runner.lines(),
            vec![
                "pack . -t jozu.ml/acme/titanic-survivability:v1",
                "push jozu.ml/acme/titanic-survivability:v1",
                "unpack -o jozu.ml/acme/titanic-survivability:v1",
            ]
        );
        assert!(
            runner
                .calls()
                .iter()
                .all(|c| c.cwd.as_deref() == Some(dir.path()))
        );
    }

    #[test]
    fn test_unpack_accepts_short_reference() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockCommandRunner::new());
        run(
            modelkit(ModelkitAction::Unpack {
                reference: "localhost:5000/model:v1".into(),
            }),
            &plan_with(&runner, &dir),
        )
        .unwrap();
        assert_eq!(runner.lines(), vec!["unpack -o localhost:5000/model:v1"]);
    }

    #[test]
    fn test_logout_uses_registry() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockCommandRunner::new());
        run(
            modelkit(ModelkitAction::Logout {
                registry: RegistryArgs {
                    registry: "registry.example".into(),
                },
            }),
            &plan_with(&runner, &dir),
        )
        .unwrap();
        assert_eq!(runner.lines(), vec!["logout registry.example"]);
    }

    #[test]
    fn test_failed_push_is_an_error() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockCommandRunner::with_exit_codes([1]));
        let reference = "jozu.ml/acme/titanic-survivability:v1".to_string();
        let result = run(
            modelkit(ModelkitAction::Push { reference }),
            &plan_with(&runner, &dir),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_publish_with_record_updates_kitfile_then_pushes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(KITFILE_NAME),
            "package:\n  description: Titanic model\n",
        )
        .unwrap();
        let runner = Arc::new(MockCommandRunner::new());
        let plan = plan_with(&runner, &dir);
        let reference = BundleRef::new(DEFAULT_REGISTRY, "acme", DEFAULT_TAG);

        publish(&plan, &Credentials::new("alice", "secret"), &reference, true).unwrap();

        let kitfile = plan.kitfile_store().load(KitfileSource::Manifest).unwrap();
        assert!(
            kitfile
                .description()
                .unwrap()
                .contains("ModelKit tag: latest pushed at: ")
        );
        assert_eq!(
            runner.lines(),
            vec![
                "login jozu.ml -u alice --password-stdin",
                "pack . -t jozu.ml/acme/titanic-survivability:latest",
                "push jozu.ml/acme/titanic-survivability:latest",
                "logout jozu.ml",
            ]
        );
    }

    #[test]
    fn test_publish_record_without_kitfile_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockCommandRunner::new());
        let plan = plan_with(&runner, &dir);
        let reference = BundleRef::new(DEFAULT_REGISTRY, "acme", DEFAULT_TAG);

        let result = publish(&plan, &Credentials::new("alice", "secret"), &reference, true);

        assert!(result.is_err());
        assert!(!dir.path().join(KITFILE_NAME).exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_auth_args_reject_missing_password() {
        if std::env::var(PASSWORD_ENV).is_ok() {
            return;
        }
        let auth = AuthArgs {
            user: "alice".into(),
            password_stdin: false,
        };
        let err = auth.credentials().unwrap_err();
        assert!(err.to_string().contains(PASSWORD_ENV));
    }
}
