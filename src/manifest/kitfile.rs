//! Kitfile manifest loading, updating and saving.
//!
//! A Kitfile is a YAML mapping describing a ModelKit. mkit treats most of it
//! as opaque: the `code` and `datasets` sections are sequences that can be
//! replaced or appended to, `model` is replaced wholesale, and
//! `package.description` collects one line per pushed tag. Every other key is
//! carried through untouched and key order is preserved on write.
//!
//! Every update goes through a [`KitfileStore`], which persists the whole
//! mapping right after mutating a single section.

use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::KitfileError;
use crate::output::Output;

/// File name of the project manifest.
pub const KITFILE_NAME: &str = "Kitfile";

/// Directory holding the template, relative to the project directory.
pub const TEMPLATE_DIR: &str = "template";
/// File name of the template inside [`TEMPLATE_DIR`].
pub const TEMPLATE_NAME: &str = "Kitfile.template";

/// strftime format of the push timestamp recorded in the package description.
pub const PUSH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Sequence of code entries.
pub const CODE: &str = "code";
/// Sequence of dataset entries.
pub const DATASETS: &str = "datasets";
/// Model mapping, replaced wholesale.
pub const MODEL: &str = "model";
/// Package mapping; its `description` collects push annotations.
pub const PACKAGE: &str = "package";

/// Where to load a Kitfile from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KitfileSource {
    /// The project's `Kitfile`.
    #[default]
    Manifest,
    /// The read-only `template/Kitfile.template`.
    Template,
}

/// How to update a sequence section (`code` or `datasets`).
#[derive(Debug, Clone, PartialEq)]
pub enum SectionUpdate {
    /// Overwrite the section with these entries.
    Replace(Vec<Value>),
    /// Add these entries after the existing ones.
    Append(Vec<Value>),
}

impl SectionUpdate {
    pub fn new(entries: Vec<Value>, append: bool) -> Self {
        if append {
            Self::Append(entries)
        } else {
            Self::Replace(entries)
        }
    }
}

/// Build the line appended to `package.description` when a tag is pushed.
pub fn push_annotation(tag: &str, pushed_at: DateTime<Utc>) -> String {
    format!(
        "ModelKit tag: {} pushed at: {}",
        tag,
        pushed_at.format(PUSH_TIMESTAMP_FORMAT)
    )
}

/// An in-memory Kitfile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Kitfile(Mapping);

impl Kitfile {
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    /// Parse a Kitfile from YAML text. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, KitfileError> {
        let value: Value = serde_yaml::from_str(content).map_err(|source| KitfileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Mapping(mapping) => Ok(Self(mapping)),
            _ => Err(KitfileError::NotAMapping {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub fn into_mapping(self) -> Mapping {
        self.0
    }

    /// Look up a top-level section.
    pub fn get(&self, section: &str) -> Option<&Value> {
        self.0.get(section)
    }

    /// The top-level keys, in document order.
    pub fn section_names(&self) -> Vec<String> {
        self.0
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }

    pub fn description(&self) -> Option<&str> {
        self.get(PACKAGE)?.get("description")?.as_str()
    }

    /// Serialize to YAML, preserving key order.
    pub fn to_yaml(&self) -> Result<String, KitfileError> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.0)
    }

    fn apply_sequence_update(
        &mut self,
        section: &str,
        update: SectionUpdate,
    ) -> Result<(), KitfileError> {
        match update {
            SectionUpdate::Replace(entries) => {
                self.0.insert(section.into(), Value::Sequence(entries));
            }
            SectionUpdate::Append(entries) => match self.0.get_mut(section) {
                Some(Value::Sequence(existing)) => existing.extend(entries),
                None | Some(Value::Null) => {
                    self.0.insert(section.into(), Value::Sequence(entries));
                }
                Some(_) => {
                    return Err(KitfileError::SectionShape {
                        section: section.to_string(),
                        expected: "sequence",
                    });
                }
            },
        }
        Ok(())
    }

    fn append_to_description(&mut self, line: &str) -> Result<(), KitfileError> {
        let package = self
            .0
            .get_mut(PACKAGE)
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| KitfileError::MissingField {
                field: PACKAGE.to_string(),
            })?;
        let Some(Value::String(description)) = package.get_mut("description") else {
            return Err(KitfileError::MissingField {
                field: format!("{PACKAGE}.description"),
            });
        };
        description.push('\n');
        description.push_str(line);
        Ok(())
    }
}

/// Reads and writes the Kitfile of one project.
///
/// Paths are explicit; nothing depends on the process working directory.
#[derive(Debug, Clone)]
pub struct KitfileStore {
    manifest_path: PathBuf,
    template_path: PathBuf,
    echo: bool,
    dry_run: bool,
}

impl KitfileStore {
    /// Store for `<project_dir>/Kitfile` and `<project_dir>/template/Kitfile.template`.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        let dir = project_dir.as_ref();
        Self {
            manifest_path: dir.join(KITFILE_NAME),
            template_path: dir.join(TEMPLATE_DIR).join(TEMPLATE_NAME),
            echo: false,
            dry_run: false,
        }
    }

    /// Read and write `manifest_path` instead of `<project_dir>/Kitfile`.
    pub fn with_manifest_path(mut self, manifest_path: impl Into<PathBuf>) -> Self {
        self.manifest_path = manifest_path.into();
        self
    }

    /// Print the Kitfile after every load and save.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Apply updates in memory but never write to disk.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn path_for(&self, source: KitfileSource) -> &Path {
        match source {
            KitfileSource::Manifest => &self.manifest_path,
            KitfileSource::Template => &self.template_path,
        }
    }

    /// Load the Kitfile (or its template).
    pub fn load(&self, source: KitfileSource) -> Result<Kitfile, KitfileError> {
        let path = self.path_for(source);
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => KitfileError::NotFound {
                path: path.to_path_buf(),
            },
            _ => KitfileError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let kitfile = Kitfile::parse(&content, path)?;
        tracing::debug!(path = %path.display(), sections = ?kitfile.section_names(), "Loaded Kitfile");
        if self.echo {
            self.print(&kitfile)?;
        }
        Ok(kitfile)
    }

    /// Write the Kitfile to the manifest path, overwriting it.
    pub fn save(&self, kitfile: &Kitfile) -> Result<(), KitfileError> {
        let content = kitfile.to_yaml()?;
        if self.dry_run {
            Output::dry_run(format!("Would write {}", self.manifest_path.display()));
        } else {
            fs::write(&self.manifest_path, content).map_err(|source| KitfileError::Io {
                path: self.manifest_path.clone(),
                source,
            })?;
            tracing::debug!(path = %self.manifest_path.display(), "Saved Kitfile");
        }
        if self.echo {
            self.print(kitfile)?;
        }
        Ok(())
    }

    /// Print a human-readable dump of `kitfile`.
    pub fn print(&self, kitfile: &Kitfile) -> Result<(), KitfileError> {
        Output::header("Kitfile Contents...");
        Output::raw(kitfile.to_yaml()?);
        Ok(())
    }

    /// Copy the template to the manifest path and return it.
    pub fn init_from_template(&self) -> Result<Kitfile, KitfileError> {
        let kitfile = self.load(KitfileSource::Template)?;
        self.save(&kitfile)?;
        Ok(kitfile)
    }

    /// Replace or extend the `code` section, then save.
    pub fn update_code(
        &self,
        kitfile: &mut Kitfile,
        update: SectionUpdate,
    ) -> Result<(), KitfileError> {
        kitfile.apply_sequence_update(CODE, update)?;
        self.save(kitfile)
    }

    /// Replace or extend the `datasets` section, then save.
    pub fn update_datasets(
        &self,
        kitfile: &mut Kitfile,
        update: SectionUpdate,
    ) -> Result<(), KitfileError> {
        kitfile.apply_sequence_update(DATASETS, update)?;
        self.save(kitfile)
    }

    /// Append a "tag pushed" line stamped with the current UTC time, then save.
    pub fn record_push(&self, kitfile: &mut Kitfile, tag: &str) -> Result<(), KitfileError> {
        self.record_push_at(kitfile, tag, Utc::now())
    }

    /// Append a "tag pushed" line stamped with `pushed_at`, then save.
    pub fn record_push_at(
        &self,
        kitfile: &mut Kitfile,
        tag: &str,
        pushed_at: DateTime<Utc>,
    ) -> Result<(), KitfileError> {
        kitfile.append_to_description(&push_annotation(tag, pushed_at))?;
        self.save(kitfile)
    }

    /// Replace the `model` section wholesale, then save.
    pub fn set_model(&self, kitfile: &mut Kitfile, model: Mapping) -> Result<(), KitfileError> {
        kitfile.0.insert(MODEL.into(), Value::Mapping(model));
        self.save(kitfile)
    }
}
