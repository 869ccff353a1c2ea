//! Loading of `.names`/`.tree` model pairs from disk.
//!
//! A model is addressed by its *stem*: the path without the `.names` or
//! `.tree` extension. Load failures are reported as [`LoadError`]s, which a
//! [`Loader`] can render against the source like compiler errors.

pub mod config;
mod load;

pub use config::{Config, ConfigDiagnostic, ConfigError, ModelConfig, CONFIG_FILE_NAME};
pub use load::{
    stem_path, LoadError, LoadErrorKind, Loader, Model, NAMES_EXTENSION, TREE_EXTENSION,
};
