//! Parse tree for TQL expressions.
//!
//! The tree is produced by the parser and never mutated afterwards; merge
//! policy lives in `tql-filter`, which only walks the leaves.

use crate::span::{Span, Spanned};

/// A boolean combination of clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A single column test.
    Clause(Clause),
    /// Logical AND of conditions.
    And(Vec<Condition>),
    /// Logical OR of conditions.
    Or(Vec<Condition>),
}

impl Condition {
    /// Create an AND of conditions, unwrapping a single element.
    pub fn and(mut conditions: Vec<Condition>) -> Self {
        if conditions.len() == 1 {
            conditions.remove(0)
        } else {
            Condition::And(conditions)
        }
    }

    /// Create an OR of conditions, unwrapping a single element.
    pub fn or(mut conditions: Vec<Condition>) -> Self {
        if conditions.len() == 1 {
            conditions.remove(0)
        } else {
            Condition::Or(conditions)
        }
    }

    /// Leaf clauses in source order.
    pub fn clauses(&self) -> Vec<&Clause> {
        let mut out = Vec::new();
        self.collect_clauses(&mut out);
        out
    }

    fn collect_clauses<'a>(&'a self, out: &mut Vec<&'a Clause>) {
        match self {
            Condition::Clause(clause) => out.push(clause),
            Condition::And(conditions) | Condition::Or(conditions) => {
                for condition in conditions {
                    condition.collect_clauses(out);
                }
            }
        }
    }

    /// Span covering the whole condition.
    pub fn span(&self) -> Span {
        match self {
            Condition::Clause(clause) => clause.span,
            Condition::And(conditions) | Condition::Or(conditions) => conditions
                .iter()
                .map(Condition::span)
                .reduce(Span::merge)
                .unwrap_or_default(),
        }
    }
}

/// A test applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The column identifier.
    pub column: Spanned<String>,
    /// What the column is tested against.
    pub test: ClauseTest,
    /// Span of the whole clause.
    pub span: Span,
}

/// The operator and operand(s) of a clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseTest {
    /// `col = 'value'`
    Equals(Spanned<String>),
    /// `col contains 'value'` / `col containsIgnoreCase 'value'`
    Contains {
        phrase: Spanned<String>,
        case_sensitive: bool,
    },
    /// `col complies to 'pattern'`
    Complies(Spanned<String>),
    /// `col wordComplies 'pattern'`
    WordComplies(Spanned<String>),
    /// `col >= min and col <= max` (`<` when `exclude_max`).
    Between {
        min: Spanned<f64>,
        max: Spanned<f64>,
        exclude_max: bool,
    },
    /// `col is empty`
    IsEmpty,
    /// `col is valid`
    IsValid,
    /// `col is invalid`
    IsInvalid,
}

impl ClauseTest {
    /// Operator keyword, for diagnostics.
    pub fn operator(&self) -> &'static str {
        match self {
            ClauseTest::Equals(_) => "=",
            ClauseTest::Contains {
                case_sensitive: true,
                ..
            } => "contains",
            ClauseTest::Contains { .. } => "containsIgnoreCase",
            ClauseTest::Complies(_) => "complies to",
            ClauseTest::WordComplies(_) => "wordComplies",
            ClauseTest::Between { .. } => "between",
            ClauseTest::IsEmpty => "is empty",
            ClauseTest::IsValid => "is valid",
            ClauseTest::IsInvalid => "is invalid",
        }
    }
}
