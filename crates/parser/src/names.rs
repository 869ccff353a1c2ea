//! The `.names` grammar.
//!
//! ```text
//! state.                          | the decision attribute
//! level: continuous.
//! count: low, mid, high.
//! ```
//!
//! A statement `name.` declares the decision attribute; when there are
//! several, the last one wins. A statement `name: v1, v2, ... .` defines an
//! enumerated attribute whose values get codes in listed order, and
//! `name: continuous.` defines a continuous one. Line breaks are
//! insignificant and `|` starts a comment.
//!
//! A decision statement may also name a group rather than an attribute, with
//! the decision attribute defined right after its `.`:
//!
//! ```text
//! decision.state: stop, pause, play.
//! ```
//!
//! If no attribute has the group's name, the attribute defined there is the
//! decision.

use common::files::SourceFile;
use common::Span;
use engine::{AttributeSchema, SchemaBuilder};
use std::iter::Peekable;
use tracing::debug;

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::lexer::{Lexer, NamesToken, Token};

const CONTINUOUS: &str = "continuous";

/// Parses a whole `.names` file into a validated schema.
pub fn parse_schema(file: &SourceFile) -> ParseResult<AttributeSchema> {
    let mut parser = NamesParser::new(file);
    while !parser.done() {
        parser.statement()?;
    }
    let schema = parser.finish()?;
    debug!(
        file = %file.name(),
        attributes = schema.len(),
        decision = schema.decision_attribute().name(),
        "parsed attribute schema"
    );
    Ok(schema)
}

struct NamesParser<'a> {
    file: &'a SourceFile,
    tokens: Peekable<Lexer<'a, NamesToken>>,
    builder: SchemaBuilder,
    decision: Option<Token<'a, NamesToken>>,
    /// End of the `.` closing the last decision statement.
    decision_end: Option<usize>,
    /// Attribute defined immediately after the last decision statement.
    follower: Option<(&'a str, Span)>,
    definitions: Vec<(&'a str, Span)>,
}

impl<'a> NamesParser<'a> {
    fn new(file: &'a SourceFile) -> Self {
        Self {
            file,
            tokens: Lexer::new(file.content()).peekable(),
            builder: SchemaBuilder::new(),
            decision: None,
            decision_end: None,
            follower: None,
            definitions: vec![],
        }
    }

    fn done(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    /// Return the next token, or an error if it's a lexing error or we've
    /// reached the end of the file.
    fn next(&mut self, expected: &str) -> ParseResult<Token<'a, NamesToken>> {
        match self.tokens.next() {
            Some(tok) if tok.kind == NamesToken::Error => Err(self.unexpected(&tok, expected)),
            Some(tok) => Ok(tok),
            None => Err(ParseError::end_of_file(self.file, expected)),
        }
    }

    fn expect(&mut self, kind: NamesToken, expected: &str) -> ParseResult<Token<'a, NamesToken>> {
        let tok = self.next(expected)?;
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(self.unexpected(&tok, expected))
        }
    }

    fn unexpected(&self, tok: &Token<'a, NamesToken>, expected: &str) -> ParseError {
        let found = match tok.kind {
            NamesToken::Error => tok.kind.describe().to_string(),
            _ => format!("`{}`", tok.text),
        };
        ParseError::syntax(
            self.file,
            tok.span,
            format!("expected {expected}, found {found}"),
            format!("expected {expected}"),
        )
    }

    fn statement(&mut self) -> ParseResult<()> {
        let name = self.expect(NamesToken::Name, "an attribute name")?;
        let sep = self.next("`.` or `:`")?;
        match sep.kind {
            NamesToken::Dot => {
                self.decision = Some(name);
                self.decision_end = Some(sep.span.end);
                self.follower = None;
                Ok(())
            }
            NamesToken::Colon => {
                let (text, span) = (name.text, name.span);
                self.attribute(name)?;
                if self.decision_end == Some(span.start) {
                    self.follower = Some((text, span));
                }
                Ok(())
            }
            _ => Err(self.unexpected(&sep, "`.` or `:`")),
        }
    }

    fn attribute(&mut self, name: Token<'a, NamesToken>) -> ParseResult<()> {
        if self.builder.contains(name.text) {
            return Err(ParseError::syntax(
                self.file,
                name.span,
                format!("attribute `{}` is defined more than once", name.text),
                "redefined here",
            ));
        }

        let mut values = vec![self.expect(NamesToken::Name, "a value name")?];
        loop {
            let tok = self.next("`,` or `.`")?;
            match tok.kind {
                NamesToken::Comma => values.push(self.expect(NamesToken::Name, "a value name")?),
                NamesToken::Dot => break,
                _ => return Err(self.unexpected(&tok, "`,` or `.`")),
            }
        }

        let id = self.builder.attribute(name.text);
        self.definitions.push((name.text, name.span));
        if let [only] = values.as_slice() {
            if only.text == CONTINUOUS {
                return Ok(());
            }
        }
        for value in &values {
            self.builder.push_value(id, value.text);
        }
        Ok(())
    }

    fn finish(self) -> ParseResult<AttributeSchema> {
        let Some(decision) = self.decision else {
            let end = self.file.content().len();
            return Err(ParseError::new(
                ParseErrorKind::SchemaConsistency,
                self.file,
                Span::new(end, end),
                "no decision attribute is declared",
                "expected a `<name>.` statement",
            ));
        };
        let (name, span) = match self.follower {
            Some((attribute, span)) if !self.builder.contains(decision.text) => {
                debug!(group = decision.text, attribute, "decision group names no attribute");
                (attribute, span)
            }
            _ => (decision.text, decision.span),
        };
        let definition = self
            .definitions
            .iter()
            .find(|(defined, def_span)| *defined == name && *def_span != span)
            .map(|(_, def_span)| *def_span);
        let file = self.file;
        self.builder.finish(name).map_err(|err| {
            let err = ParseError::new(
                ParseErrorKind::SchemaConsistency,
                file,
                span,
                err.to_string(),
                "declared as the decision attribute here",
            );
            match definition {
                Some(def_span) => err.with_related(def_span, "defined here"),
                None => err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{AttributeKind, ValueType};

    fn parse(src: &str) -> ParseResult<AttributeSchema> {
        parse_schema(&SourceFile::detached("policy.names", src))
    }

    fn parse_err(src: &str) -> ParseError {
        parse(src).unwrap_err()
    }

    #[test]
    fn playback_schema() {
        let schema = parse(
            "state.\n\
             state: stop, pause, play.\n\
             level: continuous.\n\
             count: low, mid, high.\n",
        )
        .unwrap();

        assert_eq!(schema.decision_attribute().name(), "state");
        assert_eq!(schema.decision_value_max(), 3);
        assert_eq!(schema.decision_name(1), Some("pause"));
        assert_eq!(schema.decision_name(2), Some("play"));
        assert_eq!(
            schema.attribute_names().collect::<Vec<_>>(),
            ["state", "level", "count"]
        );
        let level = schema.attribute("level").unwrap();
        assert_eq!(level.kind(), AttributeKind::Continuous);
        assert_eq!(level.value_type(), ValueType::Floating);
        assert_eq!(schema.integer_value("count", "mid"), Ok(1));
    }

    #[test]
    fn layout_and_comments_are_insignificant() {
        let schema = parse(
            "| generated policy\n\
             state   .  state :\n  stop ,\n  play\n.\n\
             level: continuous. | used by the mixer\n",
        )
        .unwrap();
        assert_eq!(
            schema.attribute_values("state").unwrap(),
            [("stop", 0), ("play", 1)]
        );
        assert!(schema.attribute_values("level").unwrap().is_empty());
    }

    #[test]
    fn last_decision_wins() {
        let schema = parse("old.\nstate.\nold: a.\nstate: on, off.\n").unwrap();
        assert_eq!(schema.decision_attribute().name(), "state");
    }

    #[test]
    fn syntax_errors_report_their_line() {
        let err = parse_err("state.\nstate: stop, play.\ncount low, high.\n");
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.line, 3);
        assert_eq!(err.message, "expected `.` or `:`, found `low`");

        let err = parse_err("state.\nstate: stop,\n\n, play.\n");
        assert_eq!(err.line, 4);

        let err = parse_err("state.\nstate: stop, play\n");
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.line, 3);
        assert!(err.message.starts_with("unexpected end of file"));
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let err = parse_err("state.\nstate: a, b.\nlevel: continuous.\nlevel: x.\n");
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn decision_must_be_usable() {
        let err = parse_err("state: a, b.\n");
        assert_eq!(err.kind, ParseErrorKind::SchemaConsistency);

        let err = parse_err("\nstate.\nlevel: continuous.\n");
        assert_eq!(err.kind, ParseErrorKind::SchemaConsistency);
        assert_eq!(err.message, "decision attribute `state` is not defined");
        assert_eq!(err.line, 2);

        let err = parse_err("level.\nlevel: continuous.\n");
        assert_eq!(err.kind, ParseErrorKind::SchemaConsistency);
        assert_eq!(err.message, "decision attribute `level` must be enumerated");
        assert_eq!(err.line, 1);
        assert_eq!(
            err.related,
            Some((Span::new(7, 12), "defined here".to_string()))
        );
        assert_eq!(err.diagnostic().labels.len(), 2);
    }

    #[test]
    fn decision_group_prefix() {
        let schema = parse("decision.state:stop,pause,play.\nlevel:continuous.\n").unwrap();
        assert_eq!(schema.decision_attribute().name(), "state");
        assert_eq!(schema.decision_value_max(), 3);
        assert_eq!(schema.decision_name(1), Some("pause"));
        assert_eq!(
            schema.attribute_names().collect::<Vec<_>>(),
            ["state", "level"]
        );

        // An attribute that isn't attached to the `.` doesn't stand in.
        let err = parse_err("decision.\nstate: stop, play.\n");
        assert_eq!(err.message, "decision attribute `decision` is not defined");

        let err = parse_err("decision.level: continuous.\n");
        assert_eq!(err.kind, ParseErrorKind::SchemaConsistency);
        assert_eq!(err.message, "decision attribute `level` must be enumerated");
    }

    #[test]
    fn end_of_file_without_final_newline() {
        let err = parse_err("state.\nstate: stop, play");
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.line, 2);
        assert!(err.message.starts_with("unexpected end of file"));
    }

    #[test]
    fn repeated_value_keeps_its_code() {
        let schema = parse("state.\nstate: stop, play, stop.\n").unwrap();
        assert_eq!(schema.decision_value_max(), 2);
        assert_eq!(schema.decision_code("stop"), Some(0));
    }
}
