//! Parsers for the C4.5/C5.0 model export format: `.names` files describing
//! an attribute schema and `.tree` files describing a decision tree over it.
//!
//! Both parsers are all-or-nothing. On failure they return a single
//! [`ParseError`] pointing at the offending line, and nothing that was built
//! before the failure survives.

mod error;
pub mod lexer;
pub mod names;
pub mod tree;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use names::parse_schema;
pub use tree::{parse_tree, MAX_FORKS};
