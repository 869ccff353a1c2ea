use std::process::ExitCode;

use clap::Args;
use driver::Config;
use engine::print::{display_schema, display_tree};

use super::ModelArgs;

#[derive(Args, Debug)]
pub struct PrintArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Print the attribute schema before the tree
    #[arg(long)]
    schema: bool,
}

pub fn print(args: PrintArgs, config: &Config) -> ExitCode {
    let model = match args.model.load(config) {
        Ok(model) => model,
        Err(code) => return code,
    };

    if args.schema {
        print!("{}", display_schema(&model.schema));
        println!();
    }
    print!("{}", display_tree(&model.schema, &model.tree));
    ExitCode::SUCCESS
}
