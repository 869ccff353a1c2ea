//! Human-readable renderings of schemas and trees.

use std::fmt::Write;

use crate::schema::{Attribute, AttributeSchema};
use crate::tree::{Branch, Condition, DecisionTree, Node};
use crate::value::Value;

/// Longest rendering of an array test value before it's cut short.
const MAX_VALUE_WIDTH: usize = 60;

#[derive(Clone)]
enum TreePrefix {
    Root,
    Fork(String),
    Last(String),
}

impl TreePrefix {
    fn new_prefix(&self) -> String {
        match self {
            TreePrefix::Root => "".to_string(),
            TreePrefix::Fork(p) => format!("{p}├── "),
            TreePrefix::Last(p) => format!("{p}└── "),
        }
    }

    fn child_indent(&self) -> String {
        match self {
            TreePrefix::Root => "".to_string(),
            TreePrefix::Fork(p) => format!("{p}│   "),
            TreePrefix::Last(p) => format!("{p}    "),
        }
    }
}

/// One line per attribute, in definition order.
pub fn display_schema(schema: &AttributeSchema) -> String {
    let decision = schema.decision_attribute().id();
    let mut output = String::new();
    for attr in schema.attributes() {
        let _ = write!(output, "{} {}", attr.id(), attr.name());
        let mut tags = vec![attr.kind().to_string(), attr.value_type().to_string()];
        if attr.slot().is_valid() {
            tags.push(attr.slot().to_string());
        }
        if attr.id() == decision {
            tags.insert(0, "decision".to_string());
        }
        let _ = write!(output, " ({})", tags.join(", "));
        let values = attr.values();
        if !values.is_empty() {
            let names: Vec<_> = values
                .iter()
                .map(|(name, code)| format!("{name}={code}"))
                .collect();
            let _ = write!(output, ": {}", names.join(", "));
        }
        output.push('\n');
    }
    output
}

/// Draws the tree with one line per branch. Enumerated codes are shown by
/// name wherever the schema knows them.
pub fn display_tree(schema: &AttributeSchema, tree: &DecisionTree) -> String {
    let mut output = String::new();
    match tree.top() {
        None => {
            let _ = writeln!(output, "{} (empty)", tree.name());
        }
        Some(Node::Terminal(decision)) => {
            let _ = writeln!(output, "{} => {}", tree.name(), decision_label(schema, decision));
        }
        Some(Node::Test(test)) => {
            let _ = writeln!(output, "{}", tree.name());
            print_branches(schema, test.branches(), TreePrefix::Root, &mut output);
        }
    }
    output
}

fn print_branches(
    schema: &AttributeSchema,
    branches: &[Branch],
    parent: TreePrefix,
    output: &mut String,
) {
    let indent = parent.child_indent();
    for (i, branch) in branches.iter().enumerate() {
        let prefix = if i + 1 == branches.len() {
            TreePrefix::Last(indent.clone())
        } else {
            TreePrefix::Fork(indent.clone())
        };
        let label = branch_label(schema, branch);
        match branch.child() {
            Node::Terminal(decision) => {
                let _ = writeln!(
                    output,
                    "{}{label} => {}",
                    prefix.new_prefix(),
                    decision_label(schema, decision)
                );
            }
            Node::Test(test) => {
                let _ = writeln!(output, "{}{label}", prefix.new_prefix());
                print_branches(schema, test.branches(), prefix, output);
            }
        }
    }
}

fn branch_label(schema: &AttributeSchema, branch: &Branch) -> String {
    let attr = schema.attribute_by_id(branch.attribute());
    let name = attr.map_or("?", Attribute::name);
    let Some(test) = branch.test() else {
        return format!("{name} ?");
    };
    let value = match (test.condition, &test.value, attr) {
        (Condition::In, Value::Bitmask(mask), Some(attr)) => {
            let names: Vec<_> = mask.codes().map(|code| code_label(attr, code)).collect();
            format!("{{{}}}", names.join(", "))
        }
        (Condition::In, Value::Array(array), Some(attr)) if attr.is_enumerated() => {
            let codes: Vec<_> = array
                .items()
                .iter()
                .map(|item| match item {
                    Value::Integer(code) => code_label(attr, *code),
                    other => other.to_string(),
                })
                .collect();
            let full = format!("{{{}}}", codes.join(", "));
            if full.len() <= MAX_VALUE_WIDTH {
                full
            } else {
                test.value.format_bounded(MAX_VALUE_WIDTH)
            }
        }
        (_, Value::Integer(code), Some(attr)) if attr.is_enumerated() => code_label(attr, *code),
        (_, value, _) => value.format_bounded(MAX_VALUE_WIDTH),
    };
    format!("{name} {} {value}", test.condition)
}

fn code_label(attr: &Attribute, code: i32) -> String {
    attr.name_of(code)
        .map_or_else(|| code.to_string(), str::to_string)
}

fn decision_label(schema: &AttributeSchema, decision: &Value) -> String {
    match decision {
        Value::Integer(code) => schema
            .decision_name(*code)
            .map_or_else(|| code.to_string(), str::to_string),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, Slot};
    use crate::tree::{Test, TestNode};
    use crate::value::Bitmask;

    fn schema() -> AttributeSchema {
        let mut builder = SchemaBuilder::new();
        let state = builder.attribute("state");
        for value in ["stop", "pause", "play"] {
            builder.push_value(state, value);
        }
        builder.attribute("level");
        let count = builder.attribute("count");
        for value in ["low", "mid", "high"] {
            builder.push_value(count, value);
        }
        builder.finish("state").unwrap()
    }

    #[test]
    fn schema_listing() {
        let mut schema = schema();
        schema.bind_slot("level", Slot::new(3));
        assert_eq!(
            display_schema(&schema),
            "#0 state (decision, enumerated, integer): stop=0, pause=1, play=2\n\
             #1 level (continuous, floating, @3)\n\
             #2 count (enumerated, integer): low=0, mid=1, high=2\n"
        );
    }

    #[test]
    fn tree_drawing() {
        let schema = schema();
        let count = schema.attribute("count").unwrap();
        let level = schema.attribute("level").unwrap();
        let inner = TestNode::new()
            .with_branch(Branch::new(level, Test::new(Condition::Gt, 0.5), Node::terminal(2)))
            .with_branch(Branch::untested(level, Node::terminal(1)));
        let top = TestNode::new()
            .with_branch(Branch::new(count, Test::new(Condition::Eq, 0), Node::terminal(0)))
            .with_branch(Branch::new(
                count,
                Test::new(Condition::In, Bitmask::from_codes([1, 2]).unwrap()),
                inner.into(),
            ));
        let mut tree = DecisionTree::for_schema(&schema);
        tree.attach(top.into()).unwrap();

        assert_eq!(
            display_tree(&schema, &tree),
            "state\n\
             ├── count = low => stop\n\
             └── count in {mid, high}\n    \
                 ├── level > 0.5 => play\n    \
                 └── level ? => pause\n"
        );
    }

    #[test]
    fn single_terminal_and_empty() {
        let schema = schema();
        let mut tree = DecisionTree::for_schema(&schema);
        assert_eq!(display_tree(&schema, &tree), "state (empty)\n");
        tree.attach(Node::terminal(1)).unwrap();
        assert_eq!(display_tree(&schema, &tree), "state => pause\n");
    }
}
