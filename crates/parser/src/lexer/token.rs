use logos::Logos;

/// Tokens of a `.names` file. Line breaks carry no meaning there; statements
/// end with a period.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Logos)]
pub enum NamesToken {
    #[regex(r"\|[^\n]*", logos::skip)]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[error]
    Error,

    #[regex(r"[^ \t\r\n\f,:.|]+")]
    Name,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
}

impl NamesToken {
    pub fn describe(&self) -> &'static str {
        match self {
            NamesToken::Error => "unexpected character",
            NamesToken::Name => "a name",
            NamesToken::Dot => "`.`",
            NamesToken::Colon => "`:`",
            NamesToken::Comma => "`,`",
        }
    }
}

/// Tokens of a single `.tree` record line: `key="value"` fields, where a
/// value may be a comma separated list of quoted strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Logos)]
pub enum RecordToken {
    #[regex(r"[ \t\r\f]+", logos::skip)]
    #[error]
    Error,

    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Name,
    #[token("=")]
    Eq,
    #[regex(r#""([^"\\]|\\.)*""#)]
    Text,
    #[token(",")]
    Comma,
}

impl RecordToken {
    pub fn describe(&self) -> &'static str {
        match self {
            RecordToken::Error => "unexpected character",
            RecordToken::Name => "a field name",
            RecordToken::Eq => "`=`",
            RecordToken::Text => "a quoted value",
            RecordToken::Comma => "`,`",
        }
    }
}
