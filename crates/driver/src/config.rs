use std::fmt::Display;
use std::{fs, io};

use camino::{Utf8Path, Utf8PathBuf};
use engine::{AttributeSchema, EvalOptions, Slot, StringEquality};
use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;
use toml::{Table, Value};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "dtree.toml";

/// Settings read from a `dtree.toml` file.
///
/// ```toml
/// [model]
/// names = "policy"
/// tree = "policy"
///
/// [bindings]
/// level = 0
/// count = 1
///
/// [evaluation]
/// string-equality = "strict"
/// ```
///
/// Problems that don't prevent reading the file are collected in
/// `diagnostics` instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub model: ModelConfig,
    /// Attribute slots in file order. `None` binds every attribute to the slot matching its
    /// id.
    pub bindings: Option<IndexMap<SmolStr, usize>>,
    pub evaluation: EvalOptions,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelConfig {
    /// Stem of the `.names` file.
    pub names: Option<Utf8PathBuf>,
    /// Stem of the `.tree` file. Defaults to the names stem.
    pub tree: Option<Utf8PathBuf>,
}

impl ModelConfig {
    pub fn tree_stem(&self) -> Option<&Utf8Path> {
        self.tree.as_deref().or(self.names.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML in `{path}`: {source}")]
    Toml {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Reads and parses the config at `path`, resolving the model stems
    /// against the directory it lives in.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_owned(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(%path, diagnostics = config.diagnostics.len(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config = Config::default();
        let parsed: Table = content.parse()?;

        for (section, value) in &parsed {
            match (section.as_str(), value) {
                ("model", Value::Table(table)) => config.parse_model(table),
                ("bindings", Value::Table(table)) => config.parse_bindings(table),
                ("evaluation", Value::Table(table)) => config.parse_evaluation(table),
                ("model" | "bindings" | "evaluation", value) => {
                    config.diagnostics.push(ConfigDiagnostic::UnexpectedTomlData {
                        field: section.into(),
                        found: value.type_str().into(),
                        expected: Some("table".into()),
                    })
                }
                _ => config
                    .diagnostics
                    .push(ConfigDiagnostic::UnknownField(section.into())),
            }
        }

        Ok(config)
    }

    fn parse_model(&mut self, table: &Table) {
        for (key, value) in table {
            let slot = match key.as_str() {
                "names" => &mut self.model.names,
                "tree" => &mut self.model.tree,
                _ => {
                    self.diagnostics
                        .push(ConfigDiagnostic::UnknownField(format!("model.{key}").into()));
                    continue;
                }
            };
            match value.as_str() {
                Some(stem) => *slot = Some(Utf8PathBuf::from(stem)),
                None => self.diagnostics.push(ConfigDiagnostic::UnexpectedTomlData {
                    field: format!("model.{key}").into(),
                    found: value.type_str().into(),
                    expected: Some("string".into()),
                }),
            }
        }
    }

    fn parse_bindings(&mut self, table: &Table) {
        let mut bindings = IndexMap::new();
        for (attribute, value) in table {
            match value.as_integer().map(usize::try_from) {
                Some(Ok(slot)) if slot < Slot::INVALID.index() => {
                    bindings.insert(SmolStr::new(attribute), slot);
                }
                _ => self.diagnostics.push(ConfigDiagnostic::InvalidSlot {
                    attribute: attribute.into(),
                    found: value.to_string(),
                }),
            }
        }
        self.bindings = Some(bindings);
    }

    fn parse_evaluation(&mut self, table: &Table) {
        for (key, value) in table {
            if key != "string-equality" {
                self.diagnostics.push(ConfigDiagnostic::UnknownField(
                    format!("evaluation.{key}").into(),
                ));
                continue;
            }
            match value.as_str() {
                Some("strict") => self.evaluation.string_equality = StringEquality::Strict,
                Some("legacy") => self.evaluation.string_equality = StringEquality::Legacy,
                _ => self
                    .diagnostics
                    .push(ConfigDiagnostic::InvalidStringEquality(value.to_string())),
            }
        }
    }

    /// Makes relative model stems relative to `base`, usually the directory
    /// holding the config file.
    pub fn resolve_paths(&mut self, base: &Utf8Path) {
        for stem in [&mut self.model.names, &mut self.model.tree]
            .into_iter()
            .flatten()
        {
            if stem.is_relative() {
                *stem = base.join(&*stem);
            }
        }
    }

    /// Binds the schema's attributes to record slots. Returns the configured
    /// attributes the schema doesn't have.
    pub fn apply_bindings(&self, schema: &mut AttributeSchema) -> Vec<SmolStr> {
        let Some(bindings) = &self.bindings else {
            schema.bind_slots_by_id();
            return vec![];
        };
        let mut unknown = vec![];
        for (attribute, slot) in bindings {
            if !schema.bind_slot(attribute, Slot::new(*slot)) {
                warn!(%attribute, "binding names an unknown attribute");
                unknown.push(attribute.clone());
            }
        }
        unknown
    }

    pub fn formatted_diagnostics(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            None
        } else {
            Some(
                self.diagnostics
                    .iter()
                    .map(|diag| format!("  {diag}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigDiagnostic {
    UnknownField(SmolStr),
    InvalidSlot {
        attribute: SmolStr,
        found: String,
    },
    InvalidStringEquality(String),
    UnexpectedTomlData {
        field: SmolStr,
        found: SmolStr,
        expected: Option<SmolStr>,
    },
}

impl Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(field) => write!(f, "Unknown field {field}"),
            Self::InvalidSlot { attribute, found } => {
                write!(f, "Invalid slot {found} for attribute \"{attribute}\"")
            }
            Self::InvalidStringEquality(found) => write!(
                f,
                "Invalid string-equality {found}, expected \"strict\" or \"legacy\""
            ),
            Self::UnexpectedTomlData {
                field,
                found,
                expected,
            } => {
                if let Some(expected) = expected {
                    write!(
                        f,
                        "Expected a {expected} in field {field}, but found a {found}"
                    )
                } else {
                    write!(f, "Unexpected field {field}")
                }
            }
        }
    }
}
