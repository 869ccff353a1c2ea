//! `dtree` checks, prints and evaluates C4.5/C5.0 decision trees stored as
//! `.names`/`.tree` file pairs.
//!
//! ```text
//! dtree check policy
//! dtree print policy --schema
//! dtree eval policy active=yes role=phone --playback
//! ```
//!
//! Settings are read from `dtree.toml` in the working directory, or from the
//! file given with `--config`.

use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use common::panic::install_panic_hook;
use driver::{Config, CONFIG_FILE_NAME};

mod logging;
mod task;

use task::Command;

/// Exit status for model files that fail to load and records that can't be
/// classified.
pub(crate) const EXIT_FAILURE: u8 = 1;
/// Exit status for bad arguments and unreadable configs.
pub(crate) const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "dtree", version)]
#[command(about = "Decision tree classifier for C4.5/C5.0 models", long_about = None)]
struct CliArgs {
    /// Config file to use instead of `dtree.toml`
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    install_panic_hook();
    logging::setup_logging();

    let args = CliArgs::parse();
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match args.command {
        Command::Check(args) => task::check(args, &config),
        Command::Print(args) => task::print(args, &config),
        Command::Eval(args) => task::eval(args, &config),
    }
}

fn load_config(path: Option<&Utf8Path>) -> Result<Config, ExitCode> {
    let path = match path {
        Some(path) => path,
        None if Utf8Path::new(CONFIG_FILE_NAME).is_file() => Utf8Path::new(CONFIG_FILE_NAME),
        None => return Ok(Config::default()),
    };
    let config = Config::load(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(EXIT_USAGE)
    })?;
    if let Some(diagnostics) = config.formatted_diagnostics() {
        eprintln!("warning: ignoring parts of `{path}`:\n{diagnostics}");
    }
    Ok(config)
}
