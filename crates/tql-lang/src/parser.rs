//! Recursive descent parser for TQL.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::span::{Span, Spanned};

/// Parser for the textual predicate language.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    source: &'source str,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
            source,
        }
    }

    /// Parse a complete expression, rejecting trailing input.
    pub fn parse_expression(&mut self) -> Result<Condition, ParseError> {
        let condition = self.parse_or_condition()?;

        if let Some(tok) = self.lexer.next_token() {
            let tok = tok?;
            return Err(ParseError::new(
                format!("unexpected {} after complete expression", tok.token.describe()),
                tok.span,
            )
            .with_hint("combine clauses with 'and' or 'or'"));
        }

        Ok(condition)
    }

    /// Parse OR conditions.
    fn parse_or_condition(&mut self) -> Result<Condition, ParseError> {
        let mut conditions = vec![self.parse_and_condition()?];

        while let Some(tok) = self.lexer.peek() {
            if tok.token != Token::Or {
                break;
            }
            self.next_token("'or'")?;
            conditions.push(self.parse_and_condition()?);
        }

        Ok(Condition::or(conditions))
    }

    /// Parse AND conditions.
    fn parse_and_condition(&mut self) -> Result<Condition, ParseError> {
        let mut conditions = vec![self.parse_primary_condition()?];

        while let Some(tok) = self.lexer.peek() {
            if tok.token != Token::And {
                break;
            }
            self.next_token("'and'")?;
            conditions.push(self.parse_primary_condition()?);
        }

        Ok(Condition::and(conditions))
    }

    /// Parse a parenthesized group or a bare clause.
    fn parse_primary_condition(&mut self) -> Result<Condition, ParseError> {
        let starts_group = matches!(
            self.lexer.peek(),
            Some(SpannedToken {
                token: Token::LParen,
                ..
            })
        );
        if !starts_group {
            return self.parse_clause().map(Condition::Clause);
        }

        let open = self.next_token("'('")?;
        let condition = self.parse_or_condition()?;
        let close = self.expect_token(Token::RParen, "')'")?;

        // A parenthesized leaf owns its parentheses.
        Ok(match condition {
            Condition::Clause(mut clause) => {
                clause.span = open.span.merge(close.span);
                Condition::Clause(clause)
            }
            other => other,
        })
    }

    /// Parse `column operator operand`.
    fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        let column = self.expect_column()?;
        let op = self.next_token("an operator")?;

        let (test, end) = match op.token {
            Token::Eq => {
                let value = self.expect_string()?;
                let end = value.span;
                (ClauseTest::Equals(value), end)
            }
            Token::Contains | Token::ContainsIgnoreCase => {
                let phrase = self.expect_string()?;
                let end = phrase.span;
                let case_sensitive = op.token == Token::Contains;
                (
                    ClauseTest::Contains {
                        phrase,
                        case_sensitive,
                    },
                    end,
                )
            }
            Token::Complies => {
                let has_to = matches!(
                    self.lexer.peek(),
                    Some(SpannedToken {
                        token: Token::To,
                        ..
                    })
                );
                if has_to {
                    self.next_token("'to'")?;
                }
                let pattern = self.expect_string()?;
                let end = pattern.span;
                (ClauseTest::Complies(pattern), end)
            }
            Token::WordComplies => {
                let pattern = self.expect_string()?;
                let end = pattern.span;
                (ClauseTest::WordComplies(pattern), end)
            }
            Token::Ge => self.parse_range_upper(&column)?,
            Token::Is => {
                let keyword = self.next_token("'empty', 'valid' or 'invalid'")?;
                let test = match keyword.token {
                    Token::Empty => ClauseTest::IsEmpty,
                    Token::Valid => ClauseTest::IsValid,
                    Token::Invalid => ClauseTest::IsInvalid,
                    other => {
                        return Err(ParseError::new(
                            format!(
                                "expected 'empty', 'valid' or 'invalid' after 'is', found {}",
                                other.describe()
                            ),
                            keyword.span,
                        ))
                    }
                };
                (test, keyword.span)
            }
            Token::Le | Token::Lt => {
                return Err(ParseError::new(
                    format!("unexpected upper bound {}", op.token.describe()),
                    op.span,
                )
                .with_hint("ranges are written 'col >= min and col <= max'"))
            }
            other => {
                return Err(ParseError::new(
                    format!("expected an operator after column, found {}", other.describe()),
                    op.span,
                ))
            }
        };

        let span = column.span.merge(end);
        Ok(Clause { column, test, span })
    }

    /// Parse the remainder of a range after `column >=`:
    /// `min and column (<= | <) max`.
    fn parse_range_upper(
        &mut self,
        column: &Spanned<String>,
    ) -> Result<(ClauseTest, Span), ParseError> {
        let min = self.expect_number()?;

        let and = self.next_token("'and'")?;
        if and.token != Token::And {
            return Err(ParseError::new(
                format!("expected 'and' after lower bound, found {}", and.token.describe()),
                and.span,
            )
            .with_hint("a lower bound must be followed by 'and <column> <= max'"));
        }

        let second = self.expect_column()?;
        if second.value != column.value {
            return Err(ParseError::new(
                format!(
                    "range bounds target different columns '{}' and '{}'",
                    column.value, second.value
                ),
                second.span,
            ));
        }

        let upper = self.next_token("'<=' or '<'")?;
        let exclude_max = match upper.token {
            Token::Le => false,
            Token::Lt => true,
            other => {
                return Err(ParseError::new(
                    format!("expected '<=' or '<', found {}", other.describe()),
                    upper.span,
                ))
            }
        };

        let max = self.expect_number()?;
        let end = max.span;
        Ok((
            ClauseTest::Between {
                min,
                max,
                exclude_max,
            },
            end,
        ))
    }

    /// Expect a column identifier; purely numeric ids are accepted.
    fn expect_column(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token("a column identifier")?;
        match tok.token {
            Token::Ident(name) | Token::Number(name) => Ok(Spanned::new(name, tok.span)),
            other => Err(ParseError::new(
                format!("expected a column identifier, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    /// Expect a single-quoted literal.
    fn expect_string(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token("a quoted value")?;
        match tok.token {
            Token::Str(s) => Ok(Spanned::new(s, tok.span)),
            Token::Ident(s) | Token::Number(s) => Err(ParseError::new(
                format!("expected a quoted value, found '{}'", s),
                tok.span,
            )
            .with_hint(format!("quote the value: '{}'", s))),
            other => Err(ParseError::new(
                format!("expected a quoted value, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    /// Expect a numeric literal.
    fn expect_number(&mut self) -> Result<Spanned<f64>, ParseError> {
        let tok = self.next_token("a number")?;
        match tok.token {
            Token::Number(raw) => raw
                .parse::<f64>()
                .map(|n| Spanned::new(n, tok.span))
                .map_err(|_| ParseError::new(format!("invalid number '{}'", raw), tok.span)),
            other => Err(ParseError::new(
                format!("expected a number, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    /// Expect and consume a specific token.
    fn expect_token(&mut self, expected: Token, what: &str) -> Result<SpannedToken, ParseError> {
        let tok = self.next_token(what)?;
        if tok.token == expected {
            Ok(tok)
        } else {
            Err(ParseError::new(
                format!("expected {}, found {}", what, tok.token.describe()),
                tok.span,
            ))
        }
    }

    /// Get the next token, or an end-of-input error naming what was expected.
    fn next_token(&mut self, expected: &str) -> Result<SpannedToken, ParseError> {
        match self.lexer.next_token() {
            Some(result) => result,
            None => Err(ParseError::unexpected_end(self.source, expected)),
        }
    }
}

/// Parse a TQL expression into a condition tree.
pub fn parse(source: &str) -> Result<Condition, ParseError> {
    Parser::new(source).parse_expression()
}
