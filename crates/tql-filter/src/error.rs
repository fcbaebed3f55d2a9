//! Filter engine error types.

use crate::model::PredicateKind;
use thiserror::Error;
use tql_lang::ParseError;

/// Errors raised by the filter engine, serializer and resolver.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Malformed TQL text. Parsing never recovers partially.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Arguments of the wrong shape for the filter type.
    #[error("{kind} filter cannot take {args} arguments")]
    ArgsMismatch {
        kind: PredicateKind,
        args: &'static str,
    },

    /// Range intervals were assigned through the value setter.
    #[error("range intervals must be changed through update_filter")]
    RangeNotSettable,

    /// The filter value is synthesized from flags and cannot be assigned.
    #[error("the value of a {0} filter is derived and cannot be set")]
    NotSettable(PredicateKind),

    /// A filter type name that is not one of the known types.
    #[error("unknown filter type '{0}'")]
    UnknownKind(String),

    /// No filter with this key is active.
    #[error("no {kind} filter on column '{col_id}'")]
    NotFound { col_id: String, kind: PredicateKind },

    /// Catalog, config or persisted filters could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    /// Render the error, with a source excerpt when it came from the parser.
    pub fn format_with_source(&self, source: &str) -> String {
        match self {
            FilterError::Parse(e) => e.format_with_source(source),
            other => format!("error: {}\n", other),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FilterError>;
