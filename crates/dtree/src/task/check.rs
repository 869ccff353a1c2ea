use std::process::ExitCode;

use clap::Args;
use driver::Config;

use super::ModelArgs;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    model: ModelArgs,
}

pub fn check(args: CheckArgs, config: &Config) -> ExitCode {
    let model = match args.model.load(config) {
        Ok(model) => model,
        Err(code) => return code,
    };

    let stats = model.tree.stats();
    println!(
        "ok: {} attributes, {} test nodes, {} terminals, depth {}",
        model.schema.len(),
        stats.tests,
        stats.terminals,
        stats.depth
    );
    ExitCode::SUCCESS
}
