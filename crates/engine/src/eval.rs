use std::cmp::Ordering;
use thiserror::Error;

use crate::record::InputRecord;
use crate::schema::AttrId;
use crate::tree::{Condition, DecisionTree, Node, Test};
use crate::value::{Value, ValueType};

/// How `=` treats string test values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEquality {
    /// Equal strings match.
    #[default]
    Strict,
    /// Different strings match. Reproduces the behaviour of older policy
    /// engines, which some hand-written trees depend on.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalOptions {
    pub string_equality: StringEquality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A test node was reached where no branch matched. Callers decide what
    /// the fallback decision is.
    #[error("no branch matched the record")]
    NoMatch,
    #[error("decision tree has no top node")]
    Unattached,
    /// A branch tests an attribute that wasn't bound to a slot before the
    /// tree was built.
    #[error("attribute {0} is tested but was never bound to a record slot")]
    UnboundSlot(AttrId),
}

/// The outcome of a successful evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision<'t> {
    pub value: &'t Value,
    pub value_type: ValueType,
}

impl Decision<'_> {
    /// The decision code, for trees deciding over an enumerated attribute.
    pub fn code(&self) -> Option<i32> {
        self.value.as_integer()
    }
}

impl DecisionTree {
    /// Classifies `record` with the default options.
    pub fn evaluate<R>(&self, record: &R) -> Result<Decision<'_>, EvalError>
    where
        R: InputRecord + ?Sized,
    {
        self.evaluate_with(record, &EvalOptions::default())
    }

    /// Walks from the top node to a terminal, taking the first matching
    /// branch of every test node on the way.
    pub fn evaluate_with<R>(
        &self,
        record: &R,
        options: &EvalOptions,
    ) -> Result<Decision<'_>, EvalError>
    where
        R: InputRecord + ?Sized,
    {
        let mut node = self.top().ok_or(EvalError::Unattached)?;
        loop {
            match node {
                Node::Terminal(value) => {
                    return Ok(Decision {
                        value,
                        value_type: self.decision_type(),
                    })
                }
                Node::Test(test) => {
                    let mut next = None;
                    for branch in test.branches() {
                        let Some(branch_test) = branch.test() else {
                            continue;
                        };
                        if !branch.slot().is_valid() {
                            return Err(EvalError::UnboundSlot(branch.attribute()));
                        }
                        let Some(input) = record.get(branch.slot()) else {
                            continue;
                        };
                        if branch_test.matches(&input, options) {
                            next = Some(branch.child());
                            break;
                        }
                    }
                    node = next.ok_or(EvalError::NoMatch)?;
                }
            }
        }
    }
}

impl Test {
    /// Whether `input` satisfies this test. Values are never coerced between
    /// types; a type mismatch is simply no match.
    pub fn matches(&self, input: &Value, options: &EvalOptions) -> bool {
        match (self.condition, &self.value) {
            (Condition::In, Value::Array(array)) => array.contains(input),
            (Condition::In, Value::Bitmask(mask)) => match input {
                Value::Integer(code) => mask.contains((*code).into()),
                Value::Unsigned(code) => mask.contains((*code).into()),
                _ => false,
            },
            (Condition::In, _) => false,

            (Condition::Eq, Value::String(expected)) => match input {
                Value::String(actual) => match options.string_equality {
                    StringEquality::Strict => actual == expected,
                    StringEquality::Legacy => actual != expected,
                },
                _ => false,
            },
            (condition, expected) => match compare(input, expected) {
                Some(ordering) => holds(condition, ordering),
                None => false,
            },
        }
    }
}

/// Orders two numeric values of the same type.
fn compare(input: &Value, expected: &Value) -> Option<Ordering> {
    match (input, expected) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Unsigned(a), Value::Unsigned(b)) => Some(a.cmp(b)),
        (Value::Floating(a), Value::Floating(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn holds(condition: Condition, ordering: Ordering) -> bool {
    match condition {
        Condition::Gt => ordering == Ordering::Greater,
        Condition::Ge => ordering != Ordering::Less,
        Condition::Eq => ordering == Ordering::Equal,
        Condition::Le => ordering != Ordering::Greater,
        Condition::Lt => ordering == Ordering::Less,
        Condition::In => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, SchemaBuilder, Slot};
    use crate::tree::{Branch, TestNode};
    use crate::value::{Bitmask, ValueArray};

    fn opts() -> EvalOptions {
        EvalOptions::default()
    }

    #[test]
    fn ordering_conditions() {
        let gt = Test::new(Condition::Gt, 5);
        assert!(gt.matches(&Value::Integer(6), &opts()));
        assert!(!gt.matches(&Value::Integer(5), &opts()));

        let ge = Test::new(Condition::Ge, 5u32);
        assert!(ge.matches(&Value::Unsigned(5), &opts()));
        assert!(!ge.matches(&Value::Unsigned(4), &opts()));

        let le = Test::new(Condition::Le, 0.5);
        assert!(le.matches(&Value::Floating(0.5), &opts()));
        assert!(!le.matches(&Value::Floating(f64::NAN), &opts()));

        let lt = Test::new(Condition::Lt, -1);
        assert!(lt.matches(&Value::Integer(-2), &opts()));
    }

    #[test]
    fn no_coercion_between_types() {
        let eq = Test::new(Condition::Eq, 1);
        assert!(!eq.matches(&Value::Unsigned(1), &opts()));
        assert!(!eq.matches(&Value::Floating(1.0), &opts()));

        let gt = Test::new(Condition::Gt, "a");
        assert!(!gt.matches(&Value::from("b"), &opts()));

        let in_scalar = Test::new(Condition::In, 1);
        assert!(!in_scalar.matches(&Value::Integer(1), &opts()));
    }

    #[test]
    fn string_equality_modes() {
        let eq = Test::new(Condition::Eq, "play");
        assert!(eq.matches(&Value::from("play"), &opts()));
        assert!(!eq.matches(&Value::from("stop"), &opts()));

        let legacy = EvalOptions {
            string_equality: StringEquality::Legacy,
        };
        assert!(!eq.matches(&Value::from("play"), &legacy));
        assert!(eq.matches(&Value::from("stop"), &legacy));
    }

    #[test]
    fn bitmask_and_array_membership_agree() {
        let codes = [0, 3, 5, 17];
        let mask = Test::new(Condition::In, Bitmask::from_codes(codes).unwrap());
        let array = Test::new(Condition::In, ValueArray::integers(codes));
        for code in 0..Bitmask::WIDTH as i32 {
            let input = Value::Integer(code);
            assert_eq!(
                mask.matches(&input, &opts()),
                array.matches(&input, &opts()),
                "code {code}"
            );
        }
        assert!(!mask.matches(&Value::Integer(Bitmask::WIDTH as i32), &opts()));
        assert!(!mask.matches(&Value::Integer(-1), &opts()));
        assert!(mask.matches(&Value::Unsigned(3), &opts()));
    }

    fn bound_schema() -> AttributeSchema {
        let mut builder = SchemaBuilder::new();
        let state = builder.attribute("state");
        for value in ["stop", "pause", "play"] {
            builder.push_value(state, value);
        }
        builder.attribute("level");
        let mut schema = builder.finish("state").unwrap();
        schema.bind_slots_by_id();
        schema
    }

    #[test]
    fn first_match_wins() {
        let schema = bound_schema();
        let level = schema.attribute("level").unwrap();
        let top = TestNode::new()
            .with_branch(Branch::new(level, Test::new(Condition::Gt, 0.5), Node::terminal(2)))
            .with_branch(Branch::new(level, Test::new(Condition::Gt, 0.8), Node::terminal(1)))
            .with_branch(Branch::new(level, Test::new(Condition::Le, 0.5), Node::terminal(0)));
        let mut tree = DecisionTree::for_schema(&schema);
        tree.attach(top.into()).unwrap();

        let record = [Value::Integer(0), Value::Floating(0.9)];
        let decision = tree.evaluate(&record).unwrap();
        assert_eq!(decision.code(), Some(2));
        assert_eq!(decision.value_type, ValueType::Integer);

        // Same record, same answer.
        for _ in 0..3 {
            assert_eq!(tree.evaluate(&record).unwrap().code(), Some(2));
        }

        let record = [Value::Integer(0), Value::Floating(0.1)];
        assert_eq!(tree.evaluate(&record).unwrap().code(), Some(0));
    }

    #[test]
    fn no_match_and_missing_values() {
        let schema = bound_schema();
        let level = schema.attribute("level").unwrap();
        let top = TestNode::new()
            .with_branch(Branch::untested(level, Node::terminal(1)))
            .with_branch(Branch::new(level, Test::new(Condition::Gt, 0.5), Node::terminal(2)));
        let mut tree = DecisionTree::for_schema(&schema);
        tree.attach(top.into()).unwrap();

        let record = [Value::Integer(0), Value::Floating(0.1)];
        assert_eq!(tree.evaluate(&record), Err(EvalError::NoMatch));
        let record = [Value::Integer(0)];
        assert_eq!(tree.evaluate(&record[..]), Err(EvalError::NoMatch));
        assert_eq!(
            DecisionTree::for_schema(&schema).evaluate(&record),
            Err(EvalError::Unattached)
        );
    }

    #[test]
    fn unbound_slot_is_reported() {
        let mut builder = SchemaBuilder::new();
        let state = builder.attribute("state");
        builder.push_value(state, "stop");
        builder.attribute("level");
        let mut schema = builder.finish("state").unwrap();
        let level = schema.attribute("level").unwrap();
        let top = TestNode::new()
            .with_branch(Branch::new(level, Test::new(Condition::Gt, 0.5), Node::terminal(0)));
        let mut tree = DecisionTree::for_schema(&schema);
        tree.attach(top.into()).unwrap();

        // Binding after the tree was built doesn't reach existing branches.
        schema.bind_slot("level", Slot::new(0));
        let record = [Value::Floating(0.9)];
        assert_eq!(
            tree.evaluate(&record),
            Err(EvalError::UnboundSlot(schema.attribute("level").unwrap().id()))
        );
    }
}
