use engine::{AttributeSchema, Value};
pub use tracing::Level;
use tracing::{
    level_filters::LevelFilter,
    subscriber::{set_default, DefaultGuard},
    Subscriber,
};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};
use tracing_tree::HierarchicalLayer;

pub fn setup_tracing_with_filter(filter: &str) -> DefaultGuard {
    let subscriber = default_subscriber().with(EnvFilter::new(filter));
    set_default(subscriber)
}

pub fn setup_tracing(level: Level) -> DefaultGuard {
    let subscriber = default_subscriber().with(LevelFilter::from_level(level));
    set_default(subscriber)
}

fn default_subscriber() -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry().with(
        HierarchicalLayer::new(2)
            .with_targets(true)
            .with_indent_lines(true)
            .with_bracketed_fields(true)
            .with_ansi(false)
            .with_writer(std::io::stderr),
    )
}

/// Builds a record laid out by attribute id, for schemas bound with
/// [`AttributeSchema::bind_slots_by_id`]. Enumerated attributes take value
/// names, continuous ones take numbers; unlisted attributes stay missing.
///
/// # Panics
/// Panics on unknown attributes or values, or unparsable numbers.
pub fn record(schema: &AttributeSchema, fields: &[(&str, &str)]) -> Vec<Option<Value>> {
    let mut record = vec![None; schema.len()];
    for (name, value) in fields {
        let attr = schema
            .attribute(name)
            .unwrap_or_else(|| panic!("unknown attribute `{name}`"));
        let value = if attr.is_enumerated() {
            Value::Integer(
                attr.code_of(value)
                    .unwrap_or_else(|| panic!("`{value}` is not a value of `{name}`")),
            )
        } else {
            Value::Floating(
                value
                    .parse()
                    .unwrap_or_else(|_| panic!("`{value}` is not a number")),
            )
        };
        record[attr.id().index()] = Some(value);
    }
    record
}
