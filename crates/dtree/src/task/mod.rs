mod check;
mod eval;
mod print;

use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Subcommand};
use common::panic::set_model_files;
use driver::{Config, Loader, Model, CONFIG_FILE_NAME};

use crate::{EXIT_FAILURE, EXIT_USAGE};

pub use check::{check, CheckArgs};
pub use eval::{eval, EvalArgs};
pub use print::{print, PrintArgs};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a model and report any errors in its files
    Check(CheckArgs),
    /// Print a model's schema and tree
    Print(PrintArgs),
    /// Classify one record given as `attribute=value` pairs
    Eval(EvalArgs),
}

/// Which `.names`/`.tree` pair to load.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Path of the model without its `.names`/`.tree` extension. Defaults to
    /// `model.names` from the config.
    stem: Option<Utf8PathBuf>,

    /// Load the tree from this stem instead
    #[arg(long)]
    tree: Option<Utf8PathBuf>,
}

impl ModelArgs {
    fn stems<'a>(&'a self, config: &'a Config) -> Option<(&'a Utf8Path, Option<&'a Utf8Path>)> {
        match &self.stem {
            Some(stem) => Some((stem.as_path(), self.tree.as_deref())),
            None => {
                let names = config.model.names.as_deref()?;
                Some((names, self.tree.as_deref().or(config.model.tree_stem())))
            }
        }
    }

    /// Loads the model, printing any failure to stderr.
    fn load(&self, config: &Config) -> Result<Model, ExitCode> {
        let Some((names, tree)) = self.stems(config) else {
            eprintln!(
                "error: no model given; pass a stem or set `model.names` in {CONFIG_FILE_NAME}"
            );
            return Err(ExitCode::from(EXIT_USAGE));
        };

        set_model_files(format!(
            "`{names}.names` and `{}.tree`",
            tree.unwrap_or(names)
        ));
        let mut loader = Loader::new();
        match loader.load_model(names, tree, config) {
            Ok(model) => {
                for attribute in &model.unknown_bindings {
                    eprintln!("warning: `{attribute}` is bound but not defined in {names}");
                }
                Ok(model)
            }
            Err(err) => {
                loader.print(&err);
                Err(ExitCode::from(EXIT_FAILURE))
            }
        }
    }
}
