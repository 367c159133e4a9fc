//! Kitfile command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use serde_yaml::{Mapping, Value};

use crate::manifest::{Kitfile, KitfileSource, SectionUpdate};
use crate::output::Output;
use crate::pipeline::ExecutionPlan;

#[derive(Debug, Args)]
pub struct KitfileArgs {
    #[command(subcommand)]
    pub action: KitfileAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Yaml,
    Json,
}

/// Where an update reads the Kitfile from before saving it.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Start from template/Kitfile.template instead of the Kitfile
    #[arg(long)]
    pub template: bool,
}

impl SourceArgs {
    fn source(&self) -> KitfileSource {
        if self.template {
            KitfileSource::Template
        } else {
            KitfileSource::Manifest
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum KitfileAction {
    /// Print the Kitfile
    Show {
        #[command(flatten)]
        source: SourceArgs,
        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: ShowFormat,
    },
    /// Create the Kitfile from template/Kitfile.template
    Init,
    /// Replace (or append to) the code section
    Code {
        #[command(flatten)]
        source: SourceArgs,
        /// Append instead of replacing the section
        #[arg(long)]
        append: bool,
        /// Path of the code file or directory
        #[arg(long, required_unless_present = "from_file")]
        path: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        license: Option<String>,
        /// Read the entries from a YAML file (a list or a single entry)
        #[arg(long, conflicts_with_all = ["path", "description", "license"])]
        from_file: Option<PathBuf>,
    },
    /// Replace (or append to) the datasets section
    Datasets {
        #[command(flatten)]
        source: SourceArgs,
        /// Append instead of replacing the section
        #[arg(long)]
        append: bool,
        /// Dataset name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,
        /// Path of the dataset file
        #[arg(long, required_unless_present = "from_file")]
        path: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        license: Option<String>,
        /// Read the entries from a YAML file (a list or a single entry)
        #[arg(long, conflicts_with_all = ["name", "path", "description", "license"])]
        from_file: Option<PathBuf>,
    },
    /// Replace the model section
    Model {
        #[command(flatten)]
        source: SourceArgs,
        /// Model name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,
        /// Path of the serialized model
        #[arg(long, required_unless_present = "from_file")]
        path: Option<String>,
        /// Framework the model was trained with (e.g., scikit-learn)
        #[arg(long)]
        framework: Option<String>,
        /// Model version
        #[arg(long)]
        model_version: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        license: Option<String>,
        /// Read the model mapping from a YAML file
        #[arg(long, conflicts_with_all = ["name", "path", "framework", "model_version", "description", "license"])]
        from_file: Option<PathBuf>,
    },
    /// Record that a ModelKit tag was pushed in the package description
    Package {
        #[command(flatten)]
        source: SourceArgs,
        /// Tag that was (or is about to be) pushed
        #[arg(long)]
        tag: String,
    },
}

/// Build a mapping from `(key, value)` pairs, skipping absent values.
///
/// Keys keep the order given.
fn entry(fields: &[(&str, Option<&String>)]) -> Mapping {
    let mut mapping = Mapping::new();
    for (key, value) in fields {
        if let Some(value) = value {
            mapping.insert(Value::from(*key), Value::from(value.as_str()));
        }
    }
    mapping
}

/// Read YAML entries from `path`: a sequence, or a single mapping.
fn read_entries(path: &Path) -> Result<Vec<Value>> {
    match read_yaml(path)? {
        Value::Sequence(entries) => Ok(entries),
        value @ Value::Mapping(_) => Ok(vec![value]),
        _ => bail!("{} must contain a list or a mapping", path.display()),
    }
}

fn read_mapping(path: &Path) -> Result<Mapping> {
    match read_yaml(path)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => bail!("{} must contain a mapping", path.display()),
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load(plan: &ExecutionPlan, source: &SourceArgs) -> Result<Kitfile> {
    let store = plan.kitfile_store();
    let source = source.source();
    store
        .load(source)
        .with_context(|| format!("Failed to load {}", store.path_for(source).display()))
}

fn show(plan: &ExecutionPlan, source: &SourceArgs, format: ShowFormat) -> Result<()> {
    let store = plan.kitfile_store().with_echo(false);
    let kitfile = store.load(source.source())?;
    match format {
        ShowFormat::Yaml => Output::raw(kitfile.to_yaml()?),
        ShowFormat::Json => Output::raw(kitfile.to_json().context("Kitfile is not valid JSON")?),
    }
    Ok(())
}

pub fn run(args: KitfileArgs, plan: &ExecutionPlan) -> Result<()> {
    let store = plan.kitfile_store();

    match args.action {
        KitfileAction::Show { source, format } => show(plan, &source, format)?,

        KitfileAction::Init => {
            if store.manifest_path().exists() {
                Output::warning(format!(
                    "Overwriting existing {}",
                    store.manifest_path().display()
                ));
            }
            store.init_from_template()?;
            Output::success(format!(
                "Created {} from {}",
                store.manifest_path().display(),
                store.template_path().display()
            ));
        }

        KitfileAction::Code {
            source,
            append,
            path,
            description,
            license,
            from_file,
        } => {
            let entries = match from_file {
                Some(file) => read_entries(&file)?,
                None => vec![Value::Mapping(entry(&[
                    ("path", path.as_ref()),
                    ("description", description.as_ref()),
                    ("license", license.as_ref()),
                ]))],
            };
            let count = entries.len();
            let mut kitfile = load(plan, &source)?;
            store.update_code(&mut kitfile, SectionUpdate::new(entries, append))?;
            Output::success(section_summary("code", count, append));
        }

        KitfileAction::Datasets {
            source,
            append,
            name,
            path,
            description,
            license,
            from_file,
        } => {
            let entries = match from_file {
                Some(file) => read_entries(&file)?,
                None => vec![Value::Mapping(entry(&[
                    ("name", name.as_ref()),
                    ("path", path.as_ref()),
                    ("description", description.as_ref()),
                    ("license", license.as_ref()),
                ]))],
            };
            let count = entries.len();
            let mut kitfile = load(plan, &source)?;
            store.update_datasets(&mut kitfile, SectionUpdate::new(entries, append))?;
            Output::success(section_summary("datasets", count, append));
        }

        KitfileAction::Model {
            source,
            name,
            path,
            framework,
            model_version,
            description,
            license,
            from_file,
        } => {
            let model = match from_file {
                Some(file) => read_mapping(&file)?,
                None => entry(&[
                    ("name", name.as_ref()),
                    ("path", path.as_ref()),
                    ("framework", framework.as_ref()),
                    ("version", model_version.as_ref()),
                    ("description", description.as_ref()),
                    ("license", license.as_ref()),
                ]),
            };
            let mut kitfile = load(plan, &source)?;
            store.set_model(&mut kitfile, model)?;
            Output::success("Replaced model section");
        }

        KitfileAction::Package { source, tag } => {
            let mut kitfile = load(plan, &source)?;
            store.record_push(&mut kitfile, &tag)?;
            Output::success(format!("Recorded push of tag {tag}"));
        }
    }

    Ok(())
}

fn section_summary(section: &str, count: usize, append: bool) -> String {
    let noun = if count == 1 { "entry" } else { "entries" };
    if append {
        format!("Appended {count} {noun} to {section} section")
    } else {
        format!("Replaced {section} section with {count} {noun}")
    }
}
