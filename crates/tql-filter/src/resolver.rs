//! Reconstruction of filters from TQL.
//!
//! Parsing is delegated to `tql-lang`; this module walks the clauses of the
//! parse tree and collapses related clauses into filters:
//!
//! 1. A quality clause on a column with a QUALITY filter ORs its flag in.
//! 2. `is empty` next to a text clause of the same column becomes the empty
//!    marker criterion of that text filter.
//! 3. A text clause after `is empty` on the same column gets the empty
//!    marker prepended instead of leaving an empty-only QUALITY filter.
//! 4. Anything else is appended to the filter with the same column and type,
//!    or starts a new filter.
//!
//! Rules 2 and 3 only pair clauses of the same top-level `and` operand, so
//! `(c = 'a') and (c is empty)` stays two filters.

use crate::catalog::ColumnCatalog;
use crate::collection::FilterCollection;
use crate::config::FilterConfig;
use crate::dates::utc_to_local_midnight;
use crate::error::Result;
use crate::model::{
    Criterion, Interval, PatternArgs, PhraseArgs, Predicate, PredicateArgs, PredicateKey,
    PredicateKind, QualityArgs, RangeArgs,
};
use std::collections::HashSet;
use tql_lang::{Clause, ClauseTest, Condition};
use tracing::debug;

/// Parse TQL into filters with the default configuration.
pub fn from_tql(text: &str, columns: &ColumnCatalog) -> Result<Vec<Predicate>> {
    from_tql_with(text, columns, &FilterConfig::default())
}

/// Parse TQL into filters. Blank text yields no filters; malformed text is
/// an error and nothing is returned.
pub fn from_tql_with(
    text: &str,
    columns: &ColumnCatalog,
    config: &FilterConfig,
) -> Result<Vec<Predicate>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let condition = tql_lang::parse(text)?;
    let mut resolver = MergeResolver::new(columns, config);
    resolver.resolve(&condition)?;
    Ok(resolver.finish())
}

/// Top-level `and` operands, in order.
fn conjuncts(condition: &Condition) -> Vec<&Condition> {
    match condition {
        Condition::And(children) => children.iter().collect(),
        other => vec![other],
    }
}

struct MergeResolver<'a> {
    columns: &'a ColumnCatalog,
    config: &'a FilterConfig,
    filters: FilterCollection,
    /// Text filters touched by the current conjunct.
    touched: HashSet<PredicateKey>,
    /// Columns with an unpaired `is empty` in the current conjunct.
    pending_empty: Vec<String>,
}

impl<'a> MergeResolver<'a> {
    fn new(columns: &'a ColumnCatalog, config: &'a FilterConfig) -> Self {
        Self {
            columns,
            config,
            filters: FilterCollection::new(),
            touched: HashSet::new(),
            pending_empty: Vec::new(),
        }
    }

    fn resolve(&mut self, condition: &Condition) -> Result<()> {
        for conjunct in conjuncts(condition) {
            self.touched.clear();
            for clause in conjunct.clauses() {
                self.apply(clause)?;
            }
            self.flush_pending_empty()?;
        }
        Ok(())
    }

    fn finish(self) -> Vec<Predicate> {
        self.filters.to_vec()
    }

    fn apply(&mut self, clause: &Clause) -> Result<()> {
        let col = clause.column.value.as_str();
        match &clause.test {
            ClauseTest::Equals(value) => {
                let args = PhraseArgs::new(vec![text_criterion(&value.value)]);
                self.add_criteria(PredicateKind::Exact, col, args.into())
            }
            ClauseTest::Contains {
                phrase,
                case_sensitive,
            } => {
                let args = PhraseArgs {
                    phrase: vec![text_criterion(&phrase.value)],
                    case_sensitive: *case_sensitive,
                };
                self.add_criteria(PredicateKind::Contains, col, args.into())
            }
            ClauseTest::Complies(pattern) => {
                let args = PatternArgs::new(vec![text_criterion(&pattern.value)]);
                self.add_criteria(PredicateKind::Matches, col, args.into())
            }
            ClauseTest::WordComplies(pattern) => {
                let args = PatternArgs::new(vec![text_criterion(&pattern.value)]);
                self.add_criteria(PredicateKind::MatchesWords, col, args.into())
            }
            ClauseTest::Between {
                min,
                max,
                exclude_max,
            } => self.add_interval(col, min.value, max.value, *exclude_max),
            ClauseTest::IsEmpty => {
                self.add_empty(col);
                Ok(())
            }
            ClauseTest::IsValid => self.merge_quality(col, QualityArgs::valid()),
            ClauseTest::IsInvalid => self.merge_quality(col, QualityArgs::invalid()),
        }
    }

    /// Rule 2, or defer until the end of the conjunct.
    fn add_empty(&mut self, col: &str) {
        let paired = self
            .filters
            .iter()
            .find(|p| {
                p.col_id() == col && p.kind().has_criteria() && self.touched.contains(&p.key())
            })
            .map(|p| p.key());

        match paired {
            Some(key) => {
                if let Some(criteria) = self
                    .filters
                    .get_mut(&key)
                    .and_then(|p| p.args_mut().criteria_mut())
                {
                    if !criteria.iter().any(|c| c.denotes_empty()) {
                        criteria.push(Criterion::empty_marker());
                    }
                }
                debug!(col_id = col, filter = %key, "Empty clause merged as criterion");
            }
            None => {
                if !self.pending_empty.iter().any(|c| c == col) {
                    self.pending_empty.push(col.to_string());
                }
            }
        }
    }

    /// Rules 3 and 4 for text clauses.
    fn add_criteria(
        &mut self,
        kind: PredicateKind,
        col: &str,
        mut args: PredicateArgs,
    ) -> Result<()> {
        if let Some(index) = self.pending_empty.iter().position(|c| c == col) {
            self.pending_empty.remove(index);
            if let Some(criteria) = args.criteria_mut() {
                criteria.insert(0, Criterion::empty_marker());
            }
            debug!(col_id = col, %kind, "Empty clause prepended as criterion");
        }

        let key = PredicateKey::new(col, kind);
        match self.filters.get_mut(&key) {
            Some(existing) => {
                let new_criteria = args.criteria().unwrap_or_default();
                if let Some(criteria) = existing.args_mut().criteria_mut() {
                    for criterion in new_criteria {
                        if !criteria.iter().any(|c| c.same_as(criterion)) {
                            criteria.push(criterion.clone());
                        }
                    }
                }
            }
            None => {
                let predicate = Predicate::new(kind, col, self.columns.display_name(col), args)?;
                self.filters.push(predicate);
            }
        }
        self.touched.insert(key);
        Ok(())
    }

    fn add_interval(&mut self, col: &str, min: f64, max: f64, exclude_max: bool) -> Result<()> {
        let column_type = self.columns.column_type(col);
        let (min, max) = if column_type.is_date() {
            let offset = self.config.utc_offset();
            (
                utc_to_local_midnight(min, offset),
                utc_to_local_midnight(max, offset),
            )
        } else {
            (min, max)
        };
        let format = self.config.label_format(self.columns.find(col), column_type);
        let interval = Interval::new(min, max, exclude_max, &format);

        let key = PredicateKey::new(col, PredicateKind::InsideRange);
        match self
            .filters
            .get_mut(&key)
            .and_then(|p| p.args_mut().range_mut())
        {
            Some(range) => {
                if !range.intervals.iter().any(|i| i.same_as(&interval)) {
                    range.intervals.push(interval);
                }
            }
            None => {
                let args = RangeArgs::new(vec![interval], column_type);
                let predicate = Predicate::new(
                    PredicateKind::InsideRange,
                    col,
                    self.columns.display_name(col),
                    args,
                )?;
                self.filters.push(predicate);
            }
        }
        Ok(())
    }

    /// Rule 1, or a new QUALITY filter.
    fn merge_quality(&mut self, col: &str, flags: QualityArgs) -> Result<()> {
        let key = PredicateKey::new(col, PredicateKind::Quality);
        if let Some(existing) = self.filters.get_mut(&key) {
            if let PredicateArgs::Quality(quality) = existing.args_mut() {
                *quality = quality.union(flags);
            }
            debug!(col_id = col, "Quality flags merged");
            return Ok(());
        }
        let predicate = Predicate::new(
            PredicateKind::Quality,
            col,
            self.columns.display_name(col),
            flags,
        )?;
        self.filters.push(predicate);
        Ok(())
    }

    /// Unpaired `is empty` clauses become QUALITY filters.
    fn flush_pending_empty(&mut self) -> Result<()> {
        for col in std::mem::take(&mut self.pending_empty) {
            self.merge_quality(&col, QualityArgs::empty())?;
        }
        Ok(())
    }
}

/// Criterion for a parsed literal; the empty literal is the empty marker.
fn text_criterion(raw: &str) -> Criterion {
    if raw.is_empty() {
        Criterion::empty_marker()
    } else {
        Criterion::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMetadata, ColumnType, DatePace, Pace};
    use crate::error::FilterError;
    use crate::model::PredicateValue;
    use pretty_assertions::assert_eq;

    fn catalog() -> ColumnCatalog {
        ColumnCatalog::new(vec![
            ColumnMetadata::new("0001").with_name("firstname").with_type(ColumnType::String),
            ColumnMetadata::new("0002").with_name("age").with_type(ColumnType::Integer),
            ColumnMetadata::new("0003")
                .with_name("birth")
                .with_type(ColumnType::Date)
                .with_pace(Pace::Calendar(DatePace::Month)),
        ])
    }

    fn summary(filters: &[Predicate]) -> Vec<(String, PredicateKind, Vec<String>)> {
        filters
            .iter()
            .map(|p| (p.col_id().to_string(), p.kind(), p.value().labels()))
            .collect()
    }

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_blank_text() {
        assert!(from_tql("", &catalog()).unwrap().is_empty());
        assert!(from_tql("   ", &catalog()).unwrap().is_empty());
    }

    #[test]
    fn test_single_quality_clause() {
        let columns = ColumnCatalog::new(vec![ColumnMetadata::new("0001")]);
        let filters = from_tql("(0001 is invalid)", &columns).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].kind(), PredicateKind::Quality);
        assert_eq!(
            filters[0].args().quality(),
            Some(QualityArgs {
                empty: false,
                invalid: true,
                valid: false
            })
        );
        // unnamed column falls back to its id
        assert_eq!(filters[0].col_name(), "0001");
    }

    #[test]
    fn test_criteria_accumulate() {
        let filters = from_tql(
            "((0001 = 'Charles') or (0001 = 'O\\'Neil')) and (0001 contains 'ar')",
            &catalog(),
        )
        .unwrap();
        assert_eq!(
            summary(&filters),
            vec![
                ("0001".to_string(), PredicateKind::Exact, s(&["Charles", r"O\'Neil"])),
                ("0001".to_string(), PredicateKind::Contains, s(&["ar"])),
            ]
        );
        assert_eq!(filters[0].col_name(), "firstname");
        assert!(filters[0].editable());
        match filters[0].value() {
            PredicateValue::Criteria(criteria) => assert_eq!(criteria[1].value, "O'Neil"),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_quality_flags_merge() {
        let filters = from_tql("((0001 is empty) or (0001 is invalid))", &catalog()).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].value().labels(), s(&["invalid or empty"]));
    }

    #[test]
    fn test_empty_after_criterion() {
        let filters = from_tql("((0001 = 'Lucy') or (0001 is empty))", &catalog()).unwrap();
        assert_eq!(
            summary(&filters),
            vec![("0001".to_string(), PredicateKind::Exact, s(&["Lucy", "empty"]))]
        );
    }

    #[test]
    fn test_empty_before_criterion() {
        let filters = from_tql("((0001 is empty) or (0001 complies to 'Aa'))", &catalog()).unwrap();
        assert_eq!(
            summary(&filters),
            vec![("0001".to_string(), PredicateKind::Matches, s(&["empty", "Aa"]))]
        );
    }

    #[test]
    fn test_empty_in_other_conjunct_stays_quality() {
        let filters = from_tql("(0001 = 'Lucy') and (0001 is empty)", &catalog()).unwrap();
        assert_eq!(
            summary(&filters),
            vec![
                ("0001".to_string(), PredicateKind::Exact, s(&["Lucy"])),
                ("0001".to_string(), PredicateKind::Quality, s(&["empty"])),
            ]
        );
    }

    #[test]
    fn test_numeric_ranges() {
        let filters = from_tql(
            "((0002 >= 10 and 0002 <= 20) or (0002 >= 30 and 0002 < 40))",
            &catalog(),
        )
        .unwrap();
        assert_eq!(
            summary(&filters),
            vec![("0002".to_string(), PredicateKind::InsideRange, s(&["[10 .. 20]", "[30 .. 40["]))]
        );
        assert!(!filters[0].editable());
    }

    #[test]
    fn test_range_on_unknown_column_is_numeric() {
        let filters = from_tql("(0009 >= 5 and 0009 <= 5)", &catalog()).unwrap();
        assert_eq!(filters[0].value().labels(), s(&["[5]"]));
        assert_eq!(filters[0].args().range().unwrap().column_type, ColumnType::Other);
    }

    #[test]
    fn test_date_range_shifted_to_local() {
        let config = FilterConfig::new().with_utc_offset_minutes(60);
        let filters = from_tql_with(
            "(0003 >= 1451606400000 and 0003 < 1454284800000)",
            &catalog(),
            &config,
        )
        .unwrap();
        let range = filters[0].args().range().unwrap();
        assert_eq!(range.intervals[0].value, [1_451_602_800_000.0, 1_454_281_200_000.0]);
        assert_eq!(range.intervals[0].label, "[Jan 2016 .. Feb 2016[");
    }

    #[test]
    fn test_malformed_text_fails() {
        let err = from_tql("(0001 = Charles)", &catalog()).unwrap_err();
        assert!(matches!(err, FilterError::Parse(_)));
    }
}
