use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;

use crate::schema::{AttrId, Attribute, AttributeSchema, Slot};
use crate::value::{TypeTag, Value, ValueType};

/// The relation a branch checks between the record value and its test value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Gt,
    Ge,
    Eq,
    Le,
    Lt,
    In,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Gt => ">",
            Condition::Ge => ">=",
            Condition::Eq => "=",
            Condition::Le => "<=",
            Condition::Lt => "<",
            Condition::In => "in",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition paired with the value the record is compared against.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub condition: Condition,
    pub value: Value,
}

impl Test {
    pub fn new(condition: Condition, value: impl Into<Value>) -> Self {
        Self {
            condition,
            value: value.into(),
        }
    }
}

/// One outgoing edge of a [`TestNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    test: Option<Test>,
    attribute: AttrId,
    slot: Slot,
    child: Node,
}

impl Branch {
    /// Builds a branch testing `attribute`. The attribute's current slot is
    /// copied into the branch.
    pub fn new(attribute: &Attribute, test: Test, child: Node) -> Self {
        Self {
            test: Some(test),
            attribute: attribute.id(),
            slot: attribute.slot(),
            child,
        }
    }

    /// Builds a branch without a test. It never matches.
    pub fn untested(attribute: &Attribute, child: Node) -> Self {
        Self {
            test: None,
            attribute: attribute.id(),
            slot: attribute.slot(),
            child,
        }
    }

    pub fn test(&self) -> Option<&Test> {
        self.test.as_ref()
    }

    pub fn condition(&self) -> Option<Condition> {
        self.test.as_ref().map(|test| test.condition)
    }

    pub fn value_type(&self) -> Option<TypeTag> {
        self.test.as_ref().map(|test| test.value.type_tag())
    }

    pub fn attribute(&self) -> AttrId {
        self.attribute
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn child(&self) -> &Node {
        &self.child
    }
}

/// An inner node. Its branches are tried in insertion order and the first
/// one that matches is taken.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestNode {
    branches: Vec<Branch>,
}

impl TestNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&mut self, branch: Branch) {
        self.branches.push(branch);
    }

    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.add_branch(branch);
        self
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Test(TestNode),
    Terminal(Value),
}

impl Node {
    pub fn terminal(decision: impl Into<Value>) -> Self {
        Node::Terminal(decision.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal(_))
    }
}

impl From<TestNode> for Node {
    fn from(test: TestNode) -> Self {
        Node::Test(test)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("decision tree `{0}` already has a top node")]
    AlreadyAttached(SmolStr),
}

/// The root of a decision tree. It owns every node below it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    name: SmolStr,
    decision_type: ValueType,
    top: Option<Node>,
}

impl DecisionTree {
    pub fn new(name: impl Into<SmolStr>, decision_type: ValueType) -> Self {
        Self {
            name: name.into(),
            decision_type,
            top: None,
        }
    }

    /// An empty tree deciding over the schema's decision attribute.
    pub fn for_schema(schema: &AttributeSchema) -> Self {
        let decision = schema.decision_attribute();
        Self::new(decision.name(), decision.value_type())
    }

    /// A tree over the schema's decision attribute with `top` already
    /// attached.
    pub fn with_top(schema: &AttributeSchema, top: Node) -> Self {
        Self {
            top: Some(top),
            ..Self::for_schema(schema)
        }
    }

    /// Attaches the single top-level node. A tree only ever has one.
    pub fn attach(&mut self, top: Node) -> Result<(), TreeError> {
        if self.top.is_some() {
            return Err(TreeError::AlreadyAttached(self.name.clone()));
        }
        self.top = Some(top);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decision_type(&self) -> ValueType {
        self.decision_type
    }

    pub fn top(&self) -> Option<&Node> {
        self.top.as_ref()
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        if let Some(top) = &self.top {
            stats.visit(top, 0);
        }
        stats
    }
}

/// Shape summary of a tree, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Number of test nodes on the longest root-to-terminal path.
    pub depth: usize,
    pub tests: usize,
    pub branches: usize,
    pub terminals: usize,
}

impl TreeStats {
    fn visit(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Terminal(_) => {
                self.terminals += 1;
                self.depth = self.depth.max(depth);
            }
            Node::Test(test) => {
                self.tests += 1;
                self.branches += test.branches.len();
                if test.branches.is_empty() {
                    self.depth = self.depth.max(depth + 1);
                }
                for branch in &test.branches {
                    self.visit(&branch.child, depth + 1);
                }
            }
        }
    }
}
