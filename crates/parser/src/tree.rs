//! The `.tree` grammar.
//!
//! A tree file is a preorder listing of nodes, one record per line. A record
//! is a list of `key="value"` fields; the `type` field selects the node kind:
//!
//! * `type="0"`: a leaf, deciding the `class` value.
//! * `type="1"`: a test on every value of the enumerated attribute `att`.
//!   The first line after it is a placeholder for the unknown-value branch
//!   and is skipped; the next `forks - 1` nodes are the children for the
//!   attribute's values in code order.
//! * `type="2"`: a threshold test. Thresholds aren't carried over, so its
//!   `forks` children are kept but can never be reached.
//! * `type="3"`: a test on subsets of `att`. Each of the `forks` subsets is
//!   listed in an `elts="a","b",...` field, either on the test record itself
//!   or on `forks` lines following it, and is followed by the `forks`
//!   children.
//!
//! Files exported by C5.0 start with `id="..."` and `entries="1"` header
//! lines, which are skipped.

use common::files::SourceFile;
use common::Span;
use engine::{
    Attribute, AttributeSchema, Bitmask, Branch, Condition, DecisionTree, Node, Test, TestNode,
    ValueArray,
};
use smallvec::SmallVec;
use std::iter::Peekable;
use tracing::debug;

use crate::error::{ParseError, ParseResult};
use crate::lexer::{unquote, Lexer, RecordToken, Token};

pub const MAX_FORKS: usize = 100;

/// Parses a whole `.tree` file against `schema`. Attribute slots are copied
/// from the schema into the branches, so they must be bound beforehand.
pub fn parse_tree(schema: &AttributeSchema, file: &SourceFile) -> ParseResult<DecisionTree> {
    let mut parser = TreeParser {
        schema,
        file,
        cursor: LineCursor::new(file),
    };
    parser.header()?;
    let top = parser.node()?;
    if let Some(extra) = parser.cursor.peek_record()? {
        return Err(ParseError::syntax(
            file,
            extra.span,
            "unexpected record after the end of the tree",
            "the tree is already complete",
        ));
    }

    let tree = DecisionTree::with_top(schema, top);
    let stats = tree.stats();
    debug!(
        file = %file.name(),
        depth = stats.depth,
        tests = stats.tests,
        branches = stats.branches,
        terminals = stats.terminals,
        "parsed decision tree"
    );
    Ok(tree)
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    offset: usize,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A `key="value"` field. List fields like `elts` hold several values.
#[derive(Debug)]
struct Field<'a> {
    name: &'a str,
    span: Span,
    values: SmallVec<[(String, Span); 1]>,
}

#[derive(Debug)]
struct Record<'a> {
    span: Span,
    fields: Vec<Field<'a>>,
}

impl<'a> Record<'a> {
    fn field(&self, name: &str) -> Option<&Field<'a>> {
        self.fields.iter().find(|field| field.name == name)
    }

    fn fields_named<'r>(&'r self, name: &'r str) -> impl Iterator<Item = &'r Field<'a>> + 'r {
        self.fields.iter().filter(move |field| field.name == name)
    }
}

/// Walks the file line by line. Blank lines are skipped between records but
/// are visible to [`LineCursor::next_line`].
struct LineCursor<'a> {
    file: &'a SourceFile,
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(file: &'a SourceFile) -> Self {
        let mut lines = vec![];
        let mut offset = 0;
        for raw in file.content().split_inclusive('\n') {
            let text = raw.trim_end_matches(['\n', '\r']);
            lines.push(Line { text, offset });
            offset += raw.len();
        }
        Self {
            file,
            lines,
            pos: 0,
        }
    }

    fn skip_blank(&mut self) {
        while self.lines.get(self.pos).is_some_and(Line::is_blank) {
            self.pos += 1;
        }
    }

    fn peek_record(&mut self) -> ParseResult<Option<Record<'a>>> {
        self.skip_blank();
        match self.lines.get(self.pos) {
            Some(line) => parse_record(self.file, line).map(Some),
            None => Ok(None),
        }
    }

    fn next_record(&mut self, expected: &str) -> ParseResult<Record<'a>> {
        let record = self
            .peek_record()?
            .ok_or_else(|| ParseError::end_of_file(self.file, expected))?;
        self.pos += 1;
        Ok(record)
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        let line = self.lines.get(self.pos).copied()?;
        self.pos += 1;
        Some(line)
    }
}

fn parse_record<'a>(file: &SourceFile, line: &Line<'a>) -> ParseResult<Record<'a>> {
    let mut tokens: Peekable<Lexer<'a, RecordToken>> =
        Lexer::with_offset(line.text, line.offset).peekable();
    let span = Span::new(line.offset, line.offset + line.text.len());

    let expect = |tokens: &mut Peekable<Lexer<'a, RecordToken>>,
                      kind: RecordToken|
     -> ParseResult<Token<'a, RecordToken>> {
        match tokens.next() {
            Some(tok) if tok.kind == kind => Ok(tok),
            Some(tok) => Err(ParseError::syntax(
                file,
                tok.span,
                format!("expected {}, found `{}`", kind.describe(), tok.text),
                format!("expected {}", kind.describe()),
            )),
            None => Err(ParseError::syntax(
                file,
                Span::new(span.end, span.end),
                format!("expected {} before the end of the line", kind.describe()),
                format!("expected {}", kind.describe()),
            )),
        }
    };

    let mut fields = vec![];
    while tokens.peek().is_some() {
        let name = expect(&mut tokens, RecordToken::Name)?;
        expect(&mut tokens, RecordToken::Eq)?;
        let first = expect(&mut tokens, RecordToken::Text)?;
        let mut values = SmallVec::new();
        let mut field_span = name.span + first.span;
        values.push((unquote(first.text), first.span));
        while tokens.peek().map(|tok| tok.kind) == Some(RecordToken::Comma) {
            tokens.next();
            let value = expect(&mut tokens, RecordToken::Text)?;
            field_span += value.span;
            values.push((unquote(value.text), value.span));
        }
        fields.push(Field {
            name: name.text,
            span: field_span,
            values,
        });
    }
    Ok(Record { span, fields })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeType {
    Leaf,
    Values,
    Threshold,
    Subsets,
}

struct TreeParser<'s, 'a> {
    schema: &'s AttributeSchema,
    file: &'a SourceFile,
    cursor: LineCursor<'a>,
}

impl<'s, 'a> TreeParser<'s, 'a> {
    /// Skips the `id` and `entries` lines C5.0 writes before the first node.
    fn header(&mut self) -> ParseResult<()> {
        while let Some(record) = self.cursor.peek_record()? {
            if record.field("type").is_some() {
                break;
            }
            if let Some(entries) = record.field("entries") {
                let (count, span) = self.single(entries)?;
                if count != "1" {
                    return Err(ParseError::syntax(
                        self.file,
                        *span,
                        format!("boosted trees are not supported (entries=\"{count}\")"),
                        "expected a single tree",
                    ));
                }
            } else if record.field("id").is_none() {
                break;
            }
            self.cursor.pos += 1;
        }
        Ok(())
    }

    fn node(&mut self) -> ParseResult<Node> {
        let record = self.cursor.next_record("a node record")?;
        match self.node_type(&record)? {
            NodeType::Leaf => self.terminal(&record),
            ty => self.test(&record, ty),
        }
    }

    fn node_type(&self, record: &Record<'a>) -> ParseResult<NodeType> {
        let (ty, span) = self.single(self.required(record, "type")?)?;
        match ty.as_str() {
            "0" => Ok(NodeType::Leaf),
            "1" => Ok(NodeType::Values),
            "2" => Ok(NodeType::Threshold),
            "3" => Ok(NodeType::Subsets),
            _ => Err(ParseError::syntax(
                self.file,
                *span,
                format!("unknown node type `{ty}`"),
                "expected 0, 1, 2 or 3",
            )),
        }
    }

    fn terminal(&self, record: &Record<'a>) -> ParseResult<Node> {
        let (class, span) = self.single(self.required(record, "class")?)?;
        let decision = self.schema.decision_attribute();
        match self.schema.decision_code(class) {
            Some(code) => Ok(Node::terminal(code)),
            None => Err(ParseError::unresolved(
                self.file,
                *span,
                format!("unknown decision value `{class}`"),
                format!("not a value of `{}`", decision.name()),
            )),
        }
    }

    fn test(&mut self, record: &Record<'a>, ty: NodeType) -> ParseResult<Node> {
        let schema = self.schema;
        let (name, span) = self.single(self.required(record, "att")?)?;
        let attr = schema.attribute(name).ok_or_else(|| {
            ParseError::unresolved(
                self.file,
                *span,
                format!("unknown attribute `{name}`"),
                "not defined in the schema",
            )
        })?;
        let forks = self.forks(record)?;

        let mut node = TestNode::new();
        match ty {
            NodeType::Values => {
                self.skip_placeholder()?;
                let values = attr.values();
                let branches = forks - 1;
                if branches > values.len() {
                    let forks_field = self.required(record, "forks")?;
                    return Err(ParseError::syntax(
                        self.file,
                        forks_field.span,
                        format!(
                            "`{}` has {} values but the node has {branches} value branches",
                            attr.name(),
                            values.len()
                        ),
                        "too many forks",
                    ));
                }
                for (_, code) in values.into_iter().take(branches) {
                    let child = self.node()?;
                    node.add_branch(Branch::new(attr, Test::new(Condition::Eq, code), child));
                }
            }
            NodeType::Threshold => {
                for _ in 0..forks {
                    let child = self.node()?;
                    node.add_branch(Branch::untested(attr, child));
                }
            }
            NodeType::Subsets => {
                let subsets = self.subsets(record, attr, forks)?;
                for codes in subsets {
                    let child = self.node()?;
                    node.add_branch(Branch::new(attr, subset_test(&codes), child));
                }
            }
            NodeType::Leaf => unreachable!("leaves are handled by `terminal`"),
        }
        Ok(node.into())
    }

    fn forks(&self, record: &Record<'a>) -> ParseResult<usize> {
        let (forks, span) = self.single(self.required(record, "forks")?)?;
        match forks.parse::<usize>() {
            Ok(n) if (1..=MAX_FORKS).contains(&n) => Ok(n),
            _ => Err(ParseError::syntax(
                self.file,
                *span,
                format!("invalid fork count `{forks}`"),
                format!("expected a number between 1 and {MAX_FORKS}"),
            )),
        }
    }

    /// Consumes the line standing in for the unknown-value branch of a
    /// `type="1"` node. It's either blank or a leaf whose class is ignored.
    fn skip_placeholder(&mut self) -> ParseResult<()> {
        let line = self
            .cursor
            .next_line()
            .ok_or_else(|| ParseError::end_of_file(self.file, "a placeholder line"))?;
        if line.is_blank() {
            return Ok(());
        }
        let record = parse_record(self.file, &line)?;
        if self.node_type(&record)? != NodeType::Leaf {
            return Err(ParseError::syntax(
                self.file,
                record.span,
                "expected a blank or leaf placeholder line",
                "the first fork of a value test must be a leaf",
            ));
        }
        Ok(())
    }

    fn subsets(
        &mut self,
        record: &Record<'a>,
        attr: &Attribute,
        forks: usize,
    ) -> ParseResult<Vec<Vec<i32>>> {
        let inline: Vec<_> = record.fields_named("elts").collect();
        if inline.len() == forks {
            return inline
                .into_iter()
                .map(|field| self.subset(attr, field))
                .collect();
        }
        if let Some(extra) = inline.first() {
            return Err(ParseError::syntax(
                self.file,
                extra.span,
                format!("node has {} `elts` fields but {forks} forks", inline.len()),
                "expected one subset per fork",
            ));
        }

        let mut subsets = Vec::with_capacity(forks);
        for _ in 0..forks {
            let line = self.cursor.next_record("an `elts` record")?;
            let field = self.required(&line, "elts")?;
            subsets.push(self.subset(attr, field)?);
        }
        Ok(subsets)
    }

    fn subset(&self, attr: &Attribute, field: &Field<'a>) -> ParseResult<Vec<i32>> {
        field
            .values
            .iter()
            .map(|(value, span)| {
                attr.code_of(value).ok_or_else(|| {
                    ParseError::unresolved(
                        self.file,
                        *span,
                        format!("`{value}` is not a value of `{}`", attr.name()),
                        "unknown value",
                    )
                })
            })
            .collect()
    }

    fn required<'r>(&self, record: &'r Record<'a>, name: &str) -> ParseResult<&'r Field<'a>> {
        record.field(name).ok_or_else(|| {
            ParseError::syntax(
                self.file,
                record.span,
                format!("record has no `{name}` field"),
                format!("expected a `{name}=\"...\"` field"),
            )
        })
    }

    fn single<'r>(&self, field: &'r Field<'a>) -> ParseResult<&'r (String, Span)> {
        match field.values.as_slice() {
            [value] => Ok(value),
            _ => Err(ParseError::syntax(
                self.file,
                field.span,
                format!("`{}` takes a single value", field.name),
                "expected one quoted value",
            )),
        }
    }
}

/// A single code is an equality test. Larger subsets are membership tests,
/// stored as a bitmask when every code fits in one.
fn subset_test(codes: &[i32]) -> Test {
    if let [code] = codes {
        return Test::new(Condition::Eq, *code);
    }
    if codes.len() <= Bitmask::WIDTH {
        if let Ok(mask) = Bitmask::from_codes(codes.iter().copied()) {
            return Test::new(Condition::In, mask);
        }
    }
    Test::new(Condition::In, ValueArray::integers(codes.iter().copied()))
}
