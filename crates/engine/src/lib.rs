//! The decision-tree classification engine.
//!
//! An [`AttributeSchema`] describes the named, typed attributes a tree may
//! test and designates one enumerated attribute as the decision. A
//! [`DecisionTree`] is built over a schema, either programmatically or by the
//! `dtree-parser` crate, and classifies any [`InputRecord`] by walking its
//! test nodes until a terminal is reached.
//!
//! The schema maps each attribute to a [`Slot`] in the caller's record
//! layout. Slots must be bound before the tree is built: every branch copies
//! the slot of its attribute when it is constructed, so one schema can be
//! reused with several record layouts by binding and building again.

pub mod eval;
pub mod playback;
pub mod print;
pub mod record;
pub mod schema;
pub mod tree;
pub mod value;

pub use eval::{Decision, EvalError, EvalOptions, StringEquality};
pub use playback::{DecisionPolicy, PlaybackState, StreamDecision};
pub use record::{FnRecord, InputRecord};
pub use schema::{
    AttrId, Attribute, AttributeKind, AttributeSchema, LookupError, SchemaBuilder, SchemaError,
    Slot,
};
pub use tree::{Branch, Condition, DecisionTree, Node, Test, TestNode, TreeError, TreeStats};
pub use value::{Bitmask, TypeTag, Value, ValueArray, ValueError, ValueType};
