use camino::{Utf8Path, Utf8PathBuf};
use common::diagnostics::{diagnostics_string, print_diagnostics};
use common::files::{FileLoader, FileStore, SourceFileId};
use engine::{AttributeSchema, DecisionTree};
use parser::{ParseError, ParseErrorKind};
use smol_str::SmolStr;
use std::io;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

pub const NAMES_EXTENSION: &str = "names";
pub const TREE_EXTENSION: &str = "tree";

/// `stem` with `.extension` appended. An existing extension on the stem is
/// kept, so `policy.v2` becomes `policy.v2.names`.
pub fn stem_path(stem: &Utf8Path, extension: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{stem}.{extension}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    Io,
    Syntax,
    SchemaConsistency,
    UnresolvedReference,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {error}")]
    Parse {
        path: Utf8PathBuf,
        file: SourceFileId,
        #[source]
        error: ParseError,
    },
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Io { .. } => LoadErrorKind::Io,
            LoadError::Parse { error, .. } => match error.kind {
                ParseErrorKind::Syntax => LoadErrorKind::Syntax,
                ParseErrorKind::SchemaConsistency => LoadErrorKind::SchemaConsistency,
                ParseErrorKind::UnresolvedReference => LoadErrorKind::UnresolvedReference,
            },
        }
    }

    pub fn path(&self) -> &Utf8Path {
        match self {
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => path,
        }
    }

    /// The one-based line the error points at, if it came from parsing.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Io { .. } => None,
            LoadError::Parse { error, .. } => Some(error.line),
        }
    }
}

/// A schema with its slots bound and the tree built over it.
#[derive(Debug)]
pub struct Model {
    pub schema: AttributeSchema,
    pub tree: DecisionTree,
    /// Bound attributes the schema doesn't define.
    pub unknown_bindings: Vec<SmolStr>,
}

/// Reads model files and keeps their contents around so load errors can be
/// rendered against the source.
pub struct Loader {
    files: FileStore,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            files: FileStore::new(),
        }
    }

    pub fn with_file_loader(loader: Box<dyn FileLoader>) -> Self {
        Self {
            files: FileStore::with_loader(loader),
        }
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Loads `<stem>.names`.
    pub fn load_schema(&mut self, stem: &Utf8Path) -> Result<AttributeSchema, LoadError> {
        let path = stem_path(stem, NAMES_EXTENSION);
        let file = self.read(&path)?;
        let result = parser::parse_schema(self.files.file(file));
        let schema = self.check(path, file, result)?;
        info!(
            %stem,
            attributes = schema.len(),
            decision = schema.decision_attribute().name(),
            "loaded schema"
        );
        Ok(schema)
    }

    /// Loads `<stem>.tree` over `schema`, whose slots must already be bound.
    pub fn load_tree(
        &mut self,
        schema: &AttributeSchema,
        stem: &Utf8Path,
    ) -> Result<DecisionTree, LoadError> {
        let path = stem_path(stem, TREE_EXTENSION);
        let file = self.read(&path)?;
        let result = parser::parse_tree(schema, self.files.file(file));
        let tree = self.check(path, file, result)?;
        let stats = tree.stats();
        info!(
            %stem,
            depth = stats.depth,
            branches = stats.branches,
            "loaded decision tree"
        );
        Ok(tree)
    }

    /// Loads the schema at `names`, binds it as `config` says and loads the
    /// tree at `tree`, or at `names` if there's no separate tree stem.
    pub fn load_model(
        &mut self,
        names: &Utf8Path,
        tree: Option<&Utf8Path>,
        config: &Config,
    ) -> Result<Model, LoadError> {
        let mut schema = self.load_schema(names)?;
        let unknown_bindings = config.apply_bindings(&mut schema);
        let tree = self.load_tree(&schema, tree.unwrap_or(names))?;
        Ok(Model {
            schema,
            tree,
            unknown_bindings,
        })
    }

    fn read(&mut self, path: &Utf8Path) -> Result<SourceFileId, LoadError> {
        self.files.load_file(path).map_err(|source| {
            warn!(%path, %source, "failed to read model file");
            LoadError::Io {
                path: path.to_owned(),
                source,
            }
        })
    }

    fn check<T>(
        &self,
        path: Utf8PathBuf,
        file: SourceFileId,
        result: Result<T, ParseError>,
    ) -> Result<T, LoadError> {
        result.map_err(|error| {
            warn!(%path, line = error.line, %error, "failed to load model file");
            LoadError::Parse { path, file, error }
        })
    }

    /// Renders `err` the way a compiler renders errors, with the offending
    /// source line underneath.
    pub fn render(&self, err: &LoadError) -> String {
        match err {
            LoadError::Io { .. } => format!("error: {err}\n"),
            LoadError::Parse { file, error, .. } => {
                diagnostics_string(&[(*file, error.diagnostic())], &self.files)
            }
        }
    }

    /// Prints `err` to stderr, rendered like [`Loader::render`].
    pub fn print(&self, err: &LoadError) {
        match err {
            LoadError::Io { .. } => eprintln!("error: {err}"),
            LoadError::Parse { file, error, .. } => {
                print_diagnostics(&[(*file, error.diagnostic())], &self.files)
            }
        }
    }
}
