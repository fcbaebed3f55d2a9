//! Lexer for TQL using logos.

use crate::error::ParseError;
use crate::span::Span;
use logos::Logos;

/// Token types for the textual predicate language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Grouping
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Logical connectives
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // Comparison operators
    #[token("=")]
    Eq,
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,

    // Text operators
    #[token("contains")]
    Contains,
    #[token("containsIgnoreCase")]
    ContainsIgnoreCase,
    #[token("complies")]
    Complies,
    #[token("to")]
    To,
    #[token("wordComplies")]
    WordComplies,

    // Quality operators
    #[token("is")]
    Is,
    #[token("empty")]
    Empty,
    #[token("valid")]
    Valid,
    #[token("invalid")]
    Invalid,

    /// Column identifier that is not purely numeric (`lastname`, `0001a`).
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*|[0-9]+[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// Numeric literal, kept as source text: `0001` is a column id as much as
    /// it is a number, so the parser decides which one it is.
    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    /// Single-quoted string literal with `\\`, `\'` and `\n` escapes.
    #[regex(r"'([^'\\]|\\.)*'", |lex| {
        let s = lex.slice();
        unescape_literal(&s[1..s.len() - 1])
    })]
    Str(String),
}

impl Token {
    /// Human-readable rendering used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::And => "'and'".to_string(),
            Token::Or => "'or'".to_string(),
            Token::Eq => "'='".to_string(),
            Token::Ge => "'>='".to_string(),
            Token::Le => "'<='".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Contains => "'contains'".to_string(),
            Token::ContainsIgnoreCase => "'containsIgnoreCase'".to_string(),
            Token::Complies => "'complies'".to_string(),
            Token::To => "'to'".to_string(),
            Token::WordComplies => "'wordComplies'".to_string(),
            Token::Is => "'is'".to_string(),
            Token::Empty => "'empty'".to_string(),
            Token::Valid => "'valid'".to_string(),
            Token::Invalid => "'invalid'".to_string(),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::Str(s) => format!("string '{}'", s),
        }
    }
}

/// Undo the escaping applied by the serializer.
///
/// `\\`, `\'` and `\n` are escape sequences; any other backslash is literal.
fn unescape_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('\'') => {
                chars.next();
                result.push('\'');
            }
            Some('n') => {
                chars.next();
                result.push('\n');
            }
            Some('\\') => {
                chars.next();
                result.push('\\');
            }
            _ => result.push('\\'),
        }
    }

    result
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer producing spanned tokens with one token of lookahead.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<Result<SpannedToken, ParseError>>>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    /// Peek at the next valid token without consuming it.
    ///
    /// A pending lexing error reads as `None` here; it is surfaced by the
    /// following `next_token` call.
    pub fn peek(&mut self) -> Option<&SpannedToken> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_inner());
        }
        self.peeked
            .as_ref()
            .and_then(|o| o.as_ref())
            .and_then(|r| r.as_ref().ok())
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Option<Result<SpannedToken, ParseError>> {
        if let Some(peeked) = self.peeked.take() {
            peeked
        } else {
            self.next_inner()
        }
    }

    fn next_inner(&mut self) -> Option<Result<SpannedToken, ParseError>> {
        let result = self.inner.next()?;
        let span: Span = self.inner.span().into();
        Some(match result {
            Ok(token) => Ok(SpannedToken { token, span }),
            Err(()) => {
                let err = ParseError::new(
                    format!("unrecognized input '{}'", self.inner.slice()),
                    span,
                );
                Err(if self.inner.slice().starts_with('\'') {
                    err.with_hint("string literals must be closed with a single quote")
                } else {
                    err
                })
            }
        })
    }

    /// Get the source string.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a source string, stopping at the first lexing error.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    Lexer::new(source).collect()
}
