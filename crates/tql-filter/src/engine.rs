//! Filter lifecycle engine.
//!
//! The engine owns the active filters and decides, for every UI request,
//! whether the requested filter is added, merged into an existing one,
//! replaces it, or toggles it off.

use crate::catalog::{ColumnCatalog, ColumnType};
use crate::collection::FilterCollection;
use crate::config::FilterConfig;
use crate::dates::local_midnight;
use crate::error::{FilterError, Result};
use crate::escape::{escape, LabelFormat};
use crate::merge::{compute_from_to_range, compute_or};
use crate::model::{
    Criterion, PatternArgs, PhraseArgs, Predicate, PredicateArgs, PredicateKey, PredicateKind,
    RangeArgs, RemoveHook,
};
use crate::persist::StoredFilter;
use crate::resolver::from_tql_with;
use crate::serializer::to_tql_with;
use tracing::{debug, info, instrument};

/// Key held while requesting a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    /// Plain click: replace or toggle.
    #[default]
    None,
    /// OR the new criteria into the existing filter.
    MultiSelect,
    /// Stretch the existing range towards the new interval.
    ExtendRange,
}

/// What a request did to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Added(PredicateKey),
    Updated(PredicateKey),
    Removed(PredicateKey),
}

/// A request to add a filter.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub kind: PredicateKind,
    pub col_id: String,
    pub col_name: String,
    pub args: PredicateArgs,
    pub modifier: Modifier,
    pub escape: bool,
    pub remove_hook: Option<RemoveHook>,
}

impl FilterRequest {
    pub fn new(
        kind: PredicateKind,
        col_id: impl Into<String>,
        col_name: impl Into<String>,
        args: impl Into<PredicateArgs>,
    ) -> Self {
        Self {
            kind,
            col_id: col_id.into(),
            col_name: col_name.into(),
            args: args.into(),
            modifier: Modifier::None,
            escape: true,
            remove_hook: None,
        }
    }

    /// Set the modifier key.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Keep criterion labels as given instead of escaping the values.
    pub fn without_escape(mut self) -> Self {
        self.escape = false;
        self
    }

    /// Run `f` when the resulting filter is removed.
    pub fn on_remove(mut self, f: impl Fn(&Predicate) + Send + Sync + 'static) -> Self {
        self.remove_hook = Some(RemoveHook::new(f));
        self
    }

    /// Attach an existing remove hook.
    pub fn with_remove_hook(mut self, hook: RemoveHook) -> Self {
        self.remove_hook = Some(hook);
        self
    }
}

/// Stateful owner of the active filters.
#[derive(Debug, Default)]
pub struct FilterEngine {
    filters: FilterCollection,
    columns: ColumnCatalog,
    config: FilterConfig,
}

impl FilterEngine {
    /// Create an engine with the default configuration and no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the column catalog.
    pub fn with_columns(mut self, columns: ColumnCatalog) -> Self {
        self.columns = columns;
        self
    }

    /// Replace the column catalog used for names and range labels.
    pub fn set_columns(&mut self, columns: ColumnCatalog) {
        self.columns = columns;
    }

    pub fn columns(&self) -> &ColumnCatalog {
        &self.columns
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Active filters in display order.
    pub fn filters(&self) -> impl Iterator<Item = &Predicate> {
        self.filters.iter()
    }

    pub fn get(&self, col_id: &str, kind: PredicateKind) -> Option<&Predicate> {
        self.filters.get(&PredicateKey::new(col_id, kind))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// TQL of the active filters.
    pub fn to_tql(&self) -> String {
        to_tql_with(self.filters.iter(), &self.config)
    }

    /// Add a filter, merging it with or toggling an existing one.
    #[instrument(skip(self, request), fields(kind = %request.kind, col_id = %request.col_id))]
    pub fn add_filter(&mut self, request: FilterRequest) -> Result<FilterChange> {
        request.args.check(request.kind)?;

        let FilterRequest {
            kind,
            col_id,
            col_name,
            mut args,
            modifier,
            escape: should_escape,
            remove_hook,
        } = request;
        let key = PredicateKey::new(col_id.clone(), kind);
        let mut detached_empty_filter = false;

        if kind.has_criteria() {
            if let Some(criteria) = args.criteria_mut() {
                normalize_criteria(criteria, should_escape);
            }

            let empty_quality = PredicateKey::new(col_id.clone(), PredicateKind::Quality);
            if self
                .filters
                .get(&empty_quality)
                .is_some_and(|p| p.is_empty_only_quality())
            {
                self.detach(&empty_quality);
                detached_empty_filter = true;
                if modifier == Modifier::MultiSelect {
                    if let Some(criteria) = args.criteria_mut() {
                        if !criteria.iter().any(|c| c.is_empty) {
                            criteria.insert(0, Criterion::empty_marker());
                        }
                    }
                }
            }

            let sibling = match kind {
                PredicateKind::Matches => Some(PredicateKind::MatchesWords),
                PredicateKind::MatchesWords => Some(PredicateKind::Matches),
                _ => None,
            };
            if let Some(sibling) = sibling {
                self.detach(&PredicateKey::new(col_id.clone(), sibling));
            }
        }

        if let PredicateArgs::Range(range) = &mut args {
            if range.column_type == ColumnType::Other {
                range.column_type = self.columns.column_type(&col_id);
            }
            if range.column_type.is_date() {
                let offset = self.config.utc_offset();
                for interval in range.intervals.iter_mut() {
                    let days = interval.value.map(|bound| local_midnight(bound, offset));
                    if days != interval.value {
                        debug!(from = ?interval.value, to = ?days, "Snapped date bounds to days");
                        interval.value = days;
                        interval.label.clear();
                    }
                }
            }
            let format = self.range_format(&col_id, range.column_type);
            for interval in range.intervals.iter_mut().filter(|i| i.label.is_empty()) {
                interval.relabel(&format);
            }
        }

        if let PredicateArgs::Quality(quality) = &args {
            if quality.empty {
                for marker_kind in [
                    PredicateKind::Exact,
                    PredicateKind::Matches,
                    PredicateKind::MatchesWords,
                ] {
                    let marker_key = PredicateKey::new(col_id.clone(), marker_kind);
                    if self
                        .filters
                        .get(&marker_key)
                        .is_some_and(|p| p.has_only_empty_criterion())
                    {
                        self.detach(&marker_key);
                        detached_empty_filter = true;
                    }
                }
            }
        }

        let Some(existing) = self.filters.get(&key).map(|p| p.value()) else {
            return self.push(kind, col_id, col_name, args, remove_hook);
        };

        if detached_empty_filter && kind == PredicateKind::Quality {
            self.detach(&key);
            return self.push(kind, col_id, col_name, args, remove_hook);
        }

        let candidate = Predicate::new(kind, col_id.as_str(), col_name.as_str(), args.clone())?;
        if !detached_empty_filter && candidate.value().same_as(&existing) {
            debug!(filter = %key, "Toggled filter off");
            self.detach(&key);
            return Ok(FilterChange::Removed(key));
        }

        self.update_filter(&key, kind, args, modifier)
    }

    /// Change the type or arguments of an active filter. The remove hook and
    /// editable flag carry over to the new filter.
    #[instrument(skip(self, key, args), fields(filter = %key))]
    pub fn update_filter(
        &mut self,
        key: &PredicateKey,
        kind: PredicateKind,
        args: PredicateArgs,
        modifier: Modifier,
    ) -> Result<FilterChange> {
        args.check(kind)?;
        let old = self.filters.get(key).ok_or_else(|| FilterError::NotFound {
            col_id: key.col_id.clone(),
            kind: key.kind,
        })?;

        let args = if old.kind() == kind {
            self.merge_args(old, args, modifier)
        } else {
            args
        };

        let predicate = Predicate::new(kind, old.col_id(), old.col_name(), args)?
            .with_editable(old.editable())
            .with_remove_hook(old.remove_hook().cloned());

        if predicate.args().is_exhausted() {
            debug!(filter = %key, "Merge left no criteria, removing filter");
            self.detach(key);
            return Ok(FilterChange::Removed(key.clone()));
        }

        let new_key = predicate.key();
        if &new_key != key {
            // a type change supersedes whatever already sits on the new key
            self.detach(&new_key);
        }
        self.filters.replace(key, predicate);
        debug!(filter = %new_key, ?modifier, "Updated filter");
        Ok(FilterChange::Updated(new_key))
    }

    /// Remove an active filter and run its remove hook.
    #[instrument(skip(self, key), fields(filter = %key))]
    pub fn remove_filter(&mut self, key: &PredicateKey) -> Result<Predicate> {
        self.detach(key).ok_or_else(|| FilterError::NotFound {
            col_id: key.col_id.clone(),
            kind: key.kind,
        })
    }

    /// Remove every filter, running each remove hook. Returns how many were
    /// removed.
    #[instrument(skip(self))]
    pub fn remove_all_filters(&mut self) -> usize {
        let removed = self.filters.drain();
        for predicate in &removed {
            predicate.notify_removed();
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "Removed all filters");
        }
        removed.len()
    }

    /// Replace the active filters with the ones parsed from `text`.
    #[instrument(skip(self))]
    pub fn load_tql(&mut self, text: &str) -> Result<usize> {
        let parsed = from_tql_with(text, &self.columns, &self.config)?;
        self.remove_all_filters();
        let count = parsed.len();
        for predicate in parsed {
            self.filters.push(predicate);
        }
        info!(count, "Loaded filters from TQL");
        Ok(count)
    }

    /// Replay stored filters through [`FilterEngine::add_filter`], keeping
    /// their values and labels as stored.
    #[instrument(skip(self, stored), fields(count = stored.len()))]
    pub fn load_persisted(&mut self, stored: &[StoredFilter]) -> Result<()> {
        for filter in stored {
            let request = FilterRequest::new(
                filter.kind,
                filter.col_id.as_str(),
                filter.col_name.as_str(),
                filter.args.clone(),
            )
            .without_escape();
            self.add_filter(request)?;
        }
        Ok(())
    }

    /// Export the active filters in their stored form.
    pub fn persisted(&self) -> Vec<StoredFilter> {
        self.filters.iter().map(StoredFilter::from).collect()
    }

    fn push(
        &mut self,
        kind: PredicateKind,
        col_id: String,
        col_name: String,
        args: PredicateArgs,
        remove_hook: Option<RemoveHook>,
    ) -> Result<FilterChange> {
        let col_name = if col_name.is_empty() {
            self.columns.display_name(&col_id)
        } else {
            col_name
        };
        let predicate = Predicate::new(kind, col_id, col_name, args)?.with_remove_hook(remove_hook);
        let key = predicate.key();
        if predicate.args().is_exhausted() {
            debug!(filter = %key, "Ignoring filter without criteria");
            return Ok(FilterChange::Removed(key));
        }
        self.filters.push(predicate);
        debug!(filter = %key, "Added filter");
        Ok(FilterChange::Added(key))
    }

    /// Remove a filter if present, running its hook.
    fn detach(&mut self, key: &PredicateKey) -> Option<Predicate> {
        let predicate = self.filters.remove(key)?;
        debug!(filter = %key, "Removed filter");
        predicate.notify_removed();
        Some(predicate)
    }

    fn merge_args(&self, old: &Predicate, new: PredicateArgs, modifier: Modifier) -> PredicateArgs {
        match (old.args(), new, modifier) {
            (PredicateArgs::Phrase(old), PredicateArgs::Phrase(new), Modifier::MultiSelect) => {
                PhraseArgs {
                    phrase: compute_or(&old.phrase, &new.phrase),
                    case_sensitive: new.case_sensitive,
                }
                .into()
            }
            (PredicateArgs::Patterns(old), PredicateArgs::Patterns(new), Modifier::MultiSelect) => {
                PatternArgs {
                    patterns: compute_or(&old.patterns, &new.patterns),
                    case_sensitive: new.case_sensitive,
                }
                .into()
            }
            (PredicateArgs::Range(old_range), PredicateArgs::Range(new), Modifier::ExtendRange) => {
                let format = self.range_format(old.col_id(), old_range.column_type);
                compute_from_to_range(old_range, &new.intervals, &format).into()
            }
            (PredicateArgs::Range(old), PredicateArgs::Range(new), Modifier::MultiSelect) => {
                RangeArgs {
                    intervals: compute_or(&old.intervals, &new.intervals),
                    column_type: old.column_type,
                    direction: old.direction,
                }
                .into()
            }
            (_, new, _) => new,
        }
    }

    fn range_format(&self, col_id: &str, column_type: ColumnType) -> LabelFormat {
        self.config.label_format(self.columns.find(col_id), column_type)
    }
}

/// Normalize requested criteria: a single blank criterion is the empty
/// marker; others get escaped labels, or keep the labels they came with.
fn normalize_criteria(criteria: &mut Vec<Criterion>, should_escape: bool) {
    if let [only] = criteria.as_slice() {
        if !only.is_empty && only.value.is_empty() {
            *criteria = vec![Criterion::empty_marker()];
            return;
        }
    }
    for criterion in criteria.iter_mut().filter(|c| !c.is_empty) {
        if should_escape {
            criterion.label = Some(escape(&criterion.value));
        } else if criterion.label.is_none() {
            criterion.label = Some(criterion.value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnMetadata;
    use crate::model::{Direction, Interval, QualityArgs};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn exact(col: &str, values: &[&str]) -> FilterRequest {
        let phrase = values.iter().map(|v| Criterion::new(*v)).collect();
        FilterRequest::new(PredicateKind::Exact, col, col, PhraseArgs::new(phrase))
    }

    fn quality(col: &str, args: QualityArgs) -> FilterRequest {
        FilterRequest::new(PredicateKind::Quality, col, col, args)
    }

    fn range(col: &str, min: f64, max: f64) -> FilterRequest {
        let interval = Interval {
            label: String::new(),
            value: [min, max],
            exclude_max: true,
        };
        FilterRequest::new(
            PredicateKind::InsideRange,
            col,
            col,
            RangeArgs::new(vec![interval], ColumnType::Integer),
        )
    }

    fn labels(engine: &FilterEngine) -> Vec<(String, Vec<String>)> {
        engine
            .filters()
            .map(|p| (p.key().to_string(), p.value().labels()))
            .collect()
    }

    fn entry(key: &str, values: &[&str]) -> (String, Vec<String>) {
        (key.to_string(), values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_add_escapes_labels() {
        let mut engine = FilterEngine::new();
        let request = FilterRequest::new(
            PredicateKind::Exact,
            "0001",
            "name",
            PhraseArgs::new(vec![Criterion {
                value: "it's".to_string(),
                label: None,
                is_empty: false,
            }]),
        );
        let change = engine.add_filter(request).unwrap();
        assert_eq!(change, FilterChange::Added(PredicateKey::new("0001", PredicateKind::Exact)));
        assert_eq!(labels(&engine), vec![entry("exact on 0001", &[r"it\'s"])]);
        assert_eq!(engine.to_tql(), r"(0001 = 'it\'s')");
    }

    #[test]
    fn test_without_escape_keeps_labels() {
        let mut engine = FilterEngine::new();
        let request = FilterRequest::new(
            PredicateKind::Exact,
            "0001",
            "name",
            PhraseArgs::new(vec![
                Criterion {
                    value: "a'b".to_string(),
                    label: Some("custom".to_string()),
                    is_empty: false,
                },
                Criterion {
                    value: "c'd".to_string(),
                    label: None,
                    is_empty: false,
                },
            ]),
        )
        .without_escape();
        engine.add_filter(request).unwrap();
        assert_eq!(labels(&engine), vec![entry("exact on 0001", &["custom", "c'd"])]);
    }

    #[test]
    fn test_toggle_off() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &["Charles"])).unwrap();
        let change = engine.add_filter(exact("0001", &["Charles"])).unwrap();
        assert_eq!(change, FilterChange::Removed(PredicateKey::new("0001", PredicateKind::Exact)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_plain_click_replaces() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &["a"])).unwrap();
        engine.add_filter(exact("0002", &["x"])).unwrap();
        engine.add_filter(exact("0001", &["b"])).unwrap();
        assert_eq!(
            labels(&engine),
            vec![entry("exact on 0001", &["b"]), entry("exact on 0002", &["x"])]
        );
    }

    #[test]
    fn test_multi_select_or_merge() {
        let mut engine = FilterEngine::new();
        let multi = |values: &[&str]| exact("0001", values).with_modifier(Modifier::MultiSelect);

        engine.add_filter(exact("0001", &["a"])).unwrap();
        engine.add_filter(multi(&["b"])).unwrap();
        assert_eq!(labels(&engine), vec![entry("exact on 0001", &["a", "b"])]);

        engine.add_filter(multi(&["a"])).unwrap();
        engine.add_filter(multi(&["c"])).unwrap();
        assert_eq!(labels(&engine), vec![entry("exact on 0001", &["b", "c"])]);

        // removing the last criteria removes the filter
        let change = engine.add_filter(multi(&["c", "b"])).unwrap();
        assert_eq!(change, FilterChange::Removed(PredicateKey::new("0001", PredicateKind::Exact)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_blank_criterion_is_empty_marker() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &[""])).unwrap();
        let predicate = engine.get("0001", PredicateKind::Exact).unwrap();
        assert!(predicate.has_only_empty_criterion());
        assert_eq!(engine.to_tql(), "(0001 is empty)");
    }

    #[test]
    fn test_text_filter_detaches_empty_quality() {
        let mut engine = FilterEngine::new();
        engine.add_filter(quality("0001", QualityArgs::empty())).unwrap();
        engine.add_filter(exact("0001", &["a"])).unwrap();
        assert_eq!(labels(&engine), vec![entry("exact on 0001", &["a"])]);
    }

    #[test]
    fn test_multi_select_keeps_empty_as_criterion() {
        let mut engine = FilterEngine::new();
        engine.add_filter(quality("0001", QualityArgs::empty())).unwrap();
        engine
            .add_filter(exact("0001", &["a"]).with_modifier(Modifier::MultiSelect))
            .unwrap();
        assert_eq!(labels(&engine), vec![entry("exact on 0001", &["empty", "a"])]);
        assert_eq!(engine.to_tql(), "((0001 is empty) or (0001 = 'a'))");
    }

    #[test]
    fn test_empty_quality_detaches_marker_only_filter() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &[""])).unwrap();
        engine.add_filter(quality("0001", QualityArgs::empty())).unwrap();
        assert_eq!(labels(&engine), vec![entry("quality on 0001", &["empty"])]);
    }

    #[test]
    fn test_quality_replaced_not_merged() {
        let mut engine = FilterEngine::new();
        engine.add_filter(quality("0001", QualityArgs::invalid())).unwrap();
        engine.add_filter(quality("0001", QualityArgs::empty())).unwrap();
        assert_eq!(labels(&engine), vec![entry("quality on 0001", &["empty"])]);

        engine.add_filter(quality("0001", QualityArgs::empty())).unwrap();
        assert!(engine.is_empty());
    }

    #[test]
    fn test_matches_kinds_are_exclusive() {
        let mut engine = FilterEngine::new();
        let pattern = |kind| {
            FilterRequest::new(kind, "0001", "name", PatternArgs::new(vec![Criterion::new("Aa")]))
        };
        engine.add_filter(pattern(PredicateKind::Matches)).unwrap();
        engine.add_filter(pattern(PredicateKind::MatchesWords)).unwrap();
        assert_eq!(labels(&engine), vec![entry("matches_words on 0001", &["Aa"])]);
    }

    #[test]
    fn test_extend_range() {
        let mut engine = FilterEngine::new();
        engine.add_filter(range("0002", 10.0, 20.0)).unwrap();
        engine
            .add_filter(range("0002", 25.0, 30.0).with_modifier(Modifier::ExtendRange))
            .unwrap();
        assert_eq!(labels(&engine), vec![entry("inside_range on 0002", &["[10 .. 30["])]);
        let args = engine.get("0002", PredicateKind::InsideRange).unwrap().args();
        assert_eq!(args.range().unwrap().direction, Some(Direction::Up));

        engine
            .add_filter(range("0002", 0.0, 5.0).with_modifier(Modifier::ExtendRange))
            .unwrap();
        assert_eq!(labels(&engine), vec![entry("inside_range on 0002", &["[0 .. 30["])]);
        assert_eq!(engine.to_tql(), "(0002 >= 0 and 0002 < 30)");
    }

    #[test]
    fn test_date_bounds_snap_to_local_days() {
        let config = FilterConfig::new().with_utc_offset_minutes(60);
        let columns = ColumnCatalog::new(vec![
            ColumnMetadata::new("0003").with_name("birth").with_type(ColumnType::Date),
        ]);
        let mut engine = FilterEngine::with_config(config).with_columns(columns);
        // 2016-01-01T00:00 and 2016-02-01T00:00 at UTC+01:00
        let jan = 1_451_602_800_000.0;
        let feb = 1_454_281_200_000.0;
        let hour = 3_600_000.0;
        let interval = Interval {
            label: "stale".to_string(),
            value: [jan + 9.0 * hour, feb + 13.0 * hour],
            exclude_max: true,
        };
        engine
            .add_filter(FilterRequest::new(
                PredicateKind::InsideRange,
                "0003",
                "birth",
                RangeArgs::new(vec![interval], ColumnType::Date),
            ))
            .unwrap();

        let predicate = engine.get("0003", PredicateKind::InsideRange).unwrap();
        let range = predicate.args().range().unwrap();
        assert_eq!(range.intervals[0].value, [jan, feb]);
        assert_eq!(range.intervals[0].label, "[2016-01-01 .. 2016-02-01[");

        let tql = engine.to_tql();
        assert_eq!(tql, "(0003 >= 1451606400000 and 0003 < 1454284800000)");
        let parsed = from_tql_with(&tql, engine.columns(), engine.config()).unwrap();
        assert_eq!(parsed[0].args().range().unwrap().intervals[0].value, [jan, feb]);
    }

    #[test]
    fn test_update_filter_changes_type() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &["a"])).unwrap();
        engine.add_filter(exact("0002", &["b"])).unwrap();

        let key = PredicateKey::new("0001", PredicateKind::Exact);
        let change = engine
            .update_filter(
                &key,
                PredicateKind::Contains,
                PhraseArgs::new(vec![Criterion::new("a")]).into(),
                Modifier::None,
            )
            .unwrap();
        let contains_key = PredicateKey::new("0001", PredicateKind::Contains);
        assert_eq!(change, FilterChange::Updated(contains_key));
        assert_eq!(
            labels(&engine),
            vec![entry("exact on 0002", &["b"]), entry("contains on 0001", &["a"])]
        );
    }

    #[test]
    fn test_type_change_supersedes_target_filter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &["a"])).unwrap();

        let counter = calls.clone();
        let contains = FilterRequest::new(
            PredicateKind::Contains,
            "0001",
            "0001",
            PhraseArgs::new(vec![Criterion::new("zz")]),
        )
        .on_remove(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        engine.add_filter(contains).unwrap();
        engine.add_filter(exact("0002", &["x"])).unwrap();

        let change = engine
            .update_filter(
                &PredicateKey::new("0001", PredicateKind::Exact),
                PredicateKind::Contains,
                PhraseArgs::new(vec![Criterion::new("b")]).into(),
                Modifier::None,
            )
            .unwrap();
        let contains_key = PredicateKey::new("0001", PredicateKind::Contains);
        assert_eq!(change, FilterChange::Updated(contains_key));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            labels(&engine),
            vec![entry("exact on 0002", &["x"]), entry("contains on 0001", &["b"])]
        );
        assert_eq!(engine.to_tql(), "(0002 = 'x') and (0001 contains 'b')");
    }

    #[test]
    fn test_update_missing_filter() {
        let mut engine = FilterEngine::new();
        let key = PredicateKey::new("0001", PredicateKind::Exact);
        let err = engine
            .update_filter(
                &key,
                PredicateKind::Exact,
                PhraseArgs::new(vec![]).into(),
                Modifier::None,
            )
            .unwrap_err();
        assert!(matches!(err, FilterError::NotFound { .. }));
        assert!(matches!(engine.remove_filter(&key), Err(FilterError::NotFound { .. })));
    }

    #[test]
    fn test_remove_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = FilterEngine::new();

        let counter = calls.clone();
        engine
            .add_filter(exact("0001", &["a"]).on_remove(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        // the hook survives a merge
        engine
            .add_filter(exact("0001", &["b"]).with_modifier(Modifier::MultiSelect))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let counter = calls.clone();
        engine
            .add_filter(exact("0002", &["c"]).on_remove(move |_| {
                counter.fetch_add(10, Ordering::SeqCst);
            }))
            .unwrap();

        let removed = engine
            .remove_filter(&PredicateKey::new("0001", PredicateKind::Exact))
            .unwrap();
        assert_eq!(removed.value().labels(), vec!["a", "b"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(engine.remove_all_filters(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_args_mismatch_rejected() {
        let mut engine = FilterEngine::new();
        let request = FilterRequest::new(PredicateKind::Exact, "0001", "a", QualityArgs::empty());
        assert!(matches!(
            engine.add_filter(request),
            Err(FilterError::ArgsMismatch { .. })
        ));
    }

    #[test]
    fn test_load_tql_and_persisted() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0009", &["old"])).unwrap();
        let count = engine
            .load_tql("(0001 = 'Charles') and (0002 is invalid)")
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            labels(&engine),
            vec![entry("exact on 0001", &["Charles"]), entry("quality on 0002", &["invalid"])]
        );

        let stored = engine.persisted();
        let mut replayed = FilterEngine::new();
        replayed.load_persisted(&stored).unwrap();
        assert_eq!(replayed.to_tql(), engine.to_tql());
    }

    #[test]
    fn test_failed_load_keeps_filters() {
        let mut engine = FilterEngine::new();
        engine.add_filter(exact("0001", &["a"])).unwrap();
        assert!(engine.load_tql("(0001 = 'a'").is_err());
        assert_eq!(engine.len(), 1);
    }
}
