use std::process::ExitCode;

use clap::Args;
use driver::Config;
use engine::{AttributeSchema, DecisionPolicy, EvalError, Value};
use tracing::debug;

use super::ModelArgs;
use crate::{EXIT_FAILURE, EXIT_USAGE};

#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Attribute values: value names for enumerated attributes, numbers for
    /// continuous ones. Unlisted attributes are missing.
    #[arg(value_name = "ATTRIBUTE=VALUE")]
    values: Vec<String>,

    /// Report the stream playback state instead of the decision
    #[arg(long)]
    playback: bool,
}

pub fn eval(mut args: EvalArgs, config: &Config) -> ExitCode {
    // With the model named by the config, the first pair lands in the stem
    // position.
    if args
        .model
        .stem
        .as_ref()
        .is_some_and(|stem| stem.as_str().contains('='))
    {
        if let Some(pair) = args.model.stem.take() {
            args.values.insert(0, pair.into_string());
        }
    }

    let model = match args.model.load(config) {
        Ok(model) => model,
        Err(code) => return code,
    };
    let record = match build_record(&model.schema, &args.values) {
        Ok(record) => record,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    debug!(?record, "evaluating");

    let result = model.tree.evaluate_with(&record, &config.evaluation);
    if args.playback {
        return match DecisionPolicy::new().playback(result) {
            Ok(state) => {
                println!("{state}");
                ExitCode::SUCCESS
            }
            Err(err) => report(&model.schema, err),
        };
    }

    match result {
        Ok(decision) => {
            let decision_attribute = model.schema.decision_attribute();
            match decision.code().and_then(|code| decision_attribute.name_of(code)) {
                Some(name) => println!("{} = {name}", decision_attribute.name()),
                None => println!("{} = {}", decision_attribute.name(), decision.value),
            }
            ExitCode::SUCCESS
        }
        Err(err) => report(&model.schema, err),
    }
}

fn report(schema: &AttributeSchema, err: EvalError) -> ExitCode {
    match err {
        EvalError::UnboundSlot(id) => {
            let name = schema.attribute_by_id(id).map_or("?", |attr| attr.name());
            eprintln!("error: attribute `{name}` is tested but has no slot binding");
        }
        err => eprintln!("error: {err}"),
    }
    ExitCode::from(EXIT_FAILURE)
}

/// Lays `name=value` pairs out by slot. Attributes without a slot are
/// skipped with a warning.
fn build_record(schema: &AttributeSchema, values: &[String]) -> Result<Vec<Option<Value>>, String> {
    let width = schema
        .attributes()
        .filter(|attr| attr.slot().is_valid())
        .map(|attr| attr.slot().index() + 1)
        .max()
        .unwrap_or(0);
    let mut record = vec![None; width];

    for pair in values {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(format!("expected `attribute=value`, found `{pair}`"));
        };
        let attr = schema
            .attribute(name)
            .ok_or_else(|| format!("unknown attribute `{name}`"))?;
        let value = if attr.is_enumerated() {
            attr.code_of(value)
                .map(Value::Integer)
                .ok_or_else(|| format!("`{value}` is not a value of `{name}`"))?
        } else {
            value
                .parse::<f64>()
                .map(Value::Floating)
                .map_err(|_| format!("`{value}` is not a number, as `{name}` is continuous"))?
        };

        let slot = attr.slot();
        if !slot.is_valid() {
            eprintln!("warning: `{name}` has no slot binding, ignoring its value");
            continue;
        }
        record[slot.index()] = Some(value);
    }
    Ok(record)
}
