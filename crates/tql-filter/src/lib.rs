//! TQL Filter - Filter model, TQL adapter and filter lifecycle engine.
//!
//! Keeps the active filters of a dataset view and converts them to and from
//! TQL, the predicate language understood by the query backend.
//!
//! ```rust
//! use tql_filter::{
//!     ColumnCatalog, ColumnMetadata, Criterion, FilterEngine, FilterRequest, Modifier,
//!     PhraseArgs, PredicateKind,
//! };
//!
//! let columns = ColumnCatalog::new(vec![ColumnMetadata::new("0001").with_name("firstname")]);
//! let mut engine = FilterEngine::new().with_columns(columns);
//!
//! let charles = PhraseArgs::new(vec![Criterion::new("Charles")]);
//! engine
//!     .add_filter(FilterRequest::new(PredicateKind::Exact, "0001", "firstname", charles))
//!     .unwrap();
//!
//! let lucy = PhraseArgs::new(vec![Criterion::new("Lucy")]);
//! engine
//!     .add_filter(
//!         FilterRequest::new(PredicateKind::Exact, "0001", "firstname", lucy)
//!             .with_modifier(Modifier::MultiSelect),
//!     )
//!     .unwrap();
//!
//! assert_eq!(engine.to_tql(), "((0001 = 'Charles') or (0001 = 'Lucy'))");
//! ```

pub mod catalog;
pub mod collection;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod escape;
pub mod merge;
pub mod model;
pub mod persist;
pub mod resolver;
pub mod serializer;
pub mod shared;

pub use catalog::{ColumnCatalog, ColumnMetadata, ColumnType, DatePace, Pace};
pub use collection::FilterCollection;
pub use config::FilterConfig;
pub use engine::{FilterChange, FilterEngine, FilterRequest, Modifier};
pub use error::{FilterError, Result};
pub use escape::{escape, quote_literal, LabelFormat};
pub use model::{
    Criterion, Direction, Interval, PatternArgs, PhraseArgs, Predicate, PredicateArgs,
    PredicateKey, PredicateKind, PredicateValue, QualityArgs, RangeArgs, RemoveHook,
};
pub use persist::StoredFilter;
pub use resolver::{from_tql, from_tql_with};
pub use serializer::{to_tql, to_tql_with};
pub use shared::SharedFilterEngine;
