//! TQL: textual predicate language
//!
//! This crate recognizes the predicate expressions exchanged between the
//! data-preparation workbench and its query backend. It only builds a parse
//! tree; turning clauses into filters (and merging related clauses) is done
//! by `tql-filter`.
//!
//! # Syntax
//!
//! ```text
//! (0001 = 'Charles')
//! (0001 contains 'ar') and (0002 is invalid)
//! ((0001 = 'Charles') or (0001 = 'Bob'))
//! (0003 >= 10 and 0003 < 20)
//! (0004 complies to 'Aa') or (0004 is empty)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use tql_lang::{parse, ClauseTest};
//!
//! let tree = parse("(0001 is invalid)").unwrap();
//! let clauses = tree.clauses();
//! assert_eq!(clauses[0].column.value, "0001");
//! assert_eq!(clauses[0].test, ClauseTest::IsInvalid);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{Clause, ClauseTest, Condition};
pub use error::ParseError;
pub use span::{Span, Spanned};

/// Parse a source string into a condition tree.
pub fn parse(source: &str) -> Result<Condition, ParseError> {
    parser::parse(source)
}

/// Tokenize a source string (for debugging/testing).
///
/// ```rust
/// let tokens = tql_lang::tokenize("(0001 is empty)").unwrap();
/// assert_eq!(tokens.len(), 5);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<lexer::SpannedToken>, ParseError> {
    lexer::tokenize(source)
}
