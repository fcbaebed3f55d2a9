//! Predicate model: filter types, criteria, intervals and typed arguments.

use crate::catalog::ColumnType;
use crate::error::{FilterError, Result};
use crate::escape::{escape, LabelFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Label of the empty-marker criterion.
pub const EMPTY_LABEL: &str = "empty";

/// Filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// Substring match on a phrase.
    Contains,
    /// Equality with a phrase.
    Exact,
    /// Numeric or date intervals.
    InsideRange,
    /// Pattern compliance on the whole value.
    Matches,
    /// Pattern compliance word by word.
    MatchesWords,
    /// Validity and emptiness of the values.
    Quality,
}

impl PredicateKind {
    /// All filter types.
    pub const ALL: [PredicateKind; 6] = [
        PredicateKind::Contains,
        PredicateKind::Exact,
        PredicateKind::InsideRange,
        PredicateKind::Matches,
        PredicateKind::MatchesWords,
        PredicateKind::Quality,
    ];

    /// Snake-case name, also used as badge class.
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Contains => "contains",
            PredicateKind::Exact => "exact",
            PredicateKind::InsideRange => "inside_range",
            PredicateKind::Matches => "matches",
            PredicateKind::MatchesWords => "matches_words",
            PredicateKind::Quality => "quality",
        }
    }

    /// Check if filters of this type hold text criteria.
    pub fn has_criteria(&self) -> bool {
        matches!(
            self,
            PredicateKind::Contains
                | PredicateKind::Exact
                | PredicateKind::Matches
                | PredicateKind::MatchesWords
        )
    }

    /// Check if this is one of the two pattern types.
    pub fn is_pattern(&self) -> bool {
        matches!(self, PredicateKind::Matches | PredicateKind::MatchesWords)
    }

    /// Whether new filters of this type can be edited in place.
    pub fn default_editable(&self) -> bool {
        matches!(self, PredicateKind::Contains | PredicateKind::Exact)
    }
}

impl std::fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PredicateKind {
    type Err = FilterError;

    /// Accepts the snake-case names in any case (`exact`, `INSIDE_RANGE`).
    fn from_str(s: &str) -> Result<Self> {
        PredicateKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FilterError::UnknownKind(s.to_string()))
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_true() -> bool {
    true
}

/// One literal value or pattern of a filter.
///
/// `value` is the raw text used for comparison and merging; `label` is the
/// escaped form shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_empty: bool,
}

impl Criterion {
    /// Criterion from raw text, labelled with its escaped form.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: Some(escape(&value)),
            value,
            is_empty: false,
        }
    }

    /// Criterion whose label is the value as given.
    pub fn verbatim(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: Some(value.clone()),
            value,
            is_empty: false,
        }
    }

    /// The criterion standing for empty records.
    pub fn empty_marker() -> Self {
        Self {
            value: String::new(),
            label: Some(EMPTY_LABEL.to_string()),
            is_empty: true,
        }
    }

    /// Check if this criterion selects empty records.
    pub fn denotes_empty(&self) -> bool {
        self.is_empty || self.value.is_empty()
    }

    /// Display label, falling back to the raw value.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }

    /// Merge identity: same raw value and same emptiness.
    pub fn same_as(&self, other: &Criterion) -> bool {
        self.value == other.value && self.is_empty == other.is_empty
    }
}

/// One sub-range of a range filter. Bounds of date columns are epoch
/// milliseconds at local midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    #[serde(default)]
    pub label: String,
    pub value: [f64; 2],
    #[serde(default, skip_serializing_if = "is_false")]
    pub exclude_max: bool,
}

impl Interval {
    /// Create an interval labelled with `format`.
    pub fn new(min: f64, max: f64, exclude_max: bool, format: &LabelFormat) -> Self {
        Self {
            label: format.range_label(min, max, exclude_max),
            value: [min, max],
            exclude_max,
        }
    }

    pub fn min(&self) -> f64 {
        self.value[0]
    }

    pub fn max(&self) -> f64 {
        self.value[1]
    }

    /// Recompute the label from the current bounds.
    pub fn relabel(&mut self, format: &LabelFormat) {
        self.label = format.range_label(self.min(), self.max(), self.exclude_max);
    }

    /// Merge identity: same bounds.
    pub fn same_as(&self, other: &Interval) -> bool {
        self.value == other.value
    }
}

/// Direction in which a range filter was last extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    /// The upper bound moved (`1`).
    Up,
    /// The lower bound moved (`-1`).
    Down,
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Up),
            -1 => Ok(Direction::Down),
            other => Err(format!("invalid range direction {}", other)),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> i8 {
        match direction {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// Arguments of CONTAINS and EXACT filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseArgs {
    pub phrase: Vec<Criterion>,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl PhraseArgs {
    pub fn new(phrase: Vec<Criterion>) -> Self {
        Self {
            phrase,
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

/// Arguments of MATCHES and MATCHES_WORDS filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternArgs {
    pub patterns: Vec<Criterion>,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl PatternArgs {
    pub fn new(patterns: Vec<Criterion>) -> Self {
        Self {
            patterns,
            case_sensitive: true,
        }
    }
}

/// Arguments of INSIDE_RANGE filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeArgs {
    pub intervals: Vec<Interval>,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl RangeArgs {
    pub fn new(intervals: Vec<Interval>, column_type: ColumnType) -> Self {
        Self {
            intervals,
            column_type,
            direction: None,
        }
    }
}

/// Arguments of QUALITY filters. Neither `empty` nor `invalid` set means
/// the filter keeps valid records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityArgs {
    pub empty: bool,
    pub invalid: bool,
    pub valid: bool,
}

impl QualityArgs {
    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }

    pub fn invalid() -> Self {
        Self {
            invalid: true,
            ..Self::default()
        }
    }

    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// OR the flags of `other` into these.
    pub fn union(self, other: QualityArgs) -> Self {
        Self {
            empty: self.empty || other.empty,
            invalid: self.invalid || other.invalid,
            valid: self.valid || other.valid,
        }
    }

    /// Check if only the empty flag is set.
    pub fn is_empty_only(&self) -> bool {
        self.empty && !self.invalid && !self.valid
    }

    /// Label from the `(invalid, empty)` table.
    pub fn label(&self) -> &'static str {
        match (self.invalid, self.empty) {
            (true, true) => "invalid or empty",
            (true, false) => "invalid",
            (false, true) => "empty",
            (false, false) => "valid",
        }
    }
}

/// Typed filter arguments. The variant must agree with the filter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateArgs {
    Phrase(PhraseArgs),
    Patterns(PatternArgs),
    Range(RangeArgs),
    Quality(QualityArgs),
}

impl PredicateArgs {
    /// Decode JSON arguments for a filter of the given type.
    pub fn from_json_value(kind: PredicateKind, value: serde_json::Value) -> Result<Self> {
        Ok(match kind {
            PredicateKind::Contains | PredicateKind::Exact => {
                PredicateArgs::Phrase(serde_json::from_value(value)?)
            }
            PredicateKind::Matches | PredicateKind::MatchesWords => {
                PredicateArgs::Patterns(serde_json::from_value(value)?)
            }
            PredicateKind::InsideRange => PredicateArgs::Range(serde_json::from_value(value)?),
            PredicateKind::Quality => PredicateArgs::Quality(serde_json::from_value(value)?),
        })
    }

    /// Short name of the variant, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            PredicateArgs::Phrase(_) => "phrase",
            PredicateArgs::Patterns(_) => "patterns",
            PredicateArgs::Range(_) => "range",
            PredicateArgs::Quality(_) => "quality",
        }
    }

    /// Check if these arguments belong to filters of `kind`.
    pub fn fits(&self, kind: PredicateKind) -> bool {
        matches!(
            (kind, self),
            (
                PredicateKind::Contains | PredicateKind::Exact,
                PredicateArgs::Phrase(_)
            ) | (
                PredicateKind::Matches | PredicateKind::MatchesWords,
                PredicateArgs::Patterns(_)
            ) | (PredicateKind::InsideRange, PredicateArgs::Range(_))
                | (PredicateKind::Quality, PredicateArgs::Quality(_))
        )
    }

    /// Fail with `ArgsMismatch` unless these arguments fit `kind`.
    pub fn check(&self, kind: PredicateKind) -> Result<()> {
        if self.fits(kind) {
            Ok(())
        } else {
            Err(FilterError::ArgsMismatch {
                kind,
                args: self.shape(),
            })
        }
    }

    pub fn criteria(&self) -> Option<&[Criterion]> {
        match self {
            PredicateArgs::Phrase(args) => Some(&args.phrase),
            PredicateArgs::Patterns(args) => Some(&args.patterns),
            _ => None,
        }
    }

    pub fn criteria_mut(&mut self) -> Option<&mut Vec<Criterion>> {
        match self {
            PredicateArgs::Phrase(args) => Some(&mut args.phrase),
            PredicateArgs::Patterns(args) => Some(&mut args.patterns),
            _ => None,
        }
    }

    pub fn range(&self) -> Option<&RangeArgs> {
        match self {
            PredicateArgs::Range(args) => Some(args),
            _ => None,
        }
    }

    pub fn range_mut(&mut self) -> Option<&mut RangeArgs> {
        match self {
            PredicateArgs::Range(args) => Some(args),
            _ => None,
        }
    }

    pub fn quality(&self) -> Option<QualityArgs> {
        match self {
            PredicateArgs::Quality(args) => Some(*args),
            _ => None,
        }
    }

    /// Case sensitivity of text criteria; true for other shapes.
    pub fn case_sensitive(&self) -> bool {
        match self {
            PredicateArgs::Phrase(args) => args.case_sensitive,
            PredicateArgs::Patterns(args) => args.case_sensitive,
            _ => true,
        }
    }

    /// Check if a criteria or interval list is present and empty.
    pub fn is_exhausted(&self) -> bool {
        match self {
            PredicateArgs::Phrase(args) => args.phrase.is_empty(),
            PredicateArgs::Patterns(args) => args.patterns.is_empty(),
            PredicateArgs::Range(args) => args.intervals.is_empty(),
            PredicateArgs::Quality(_) => false,
        }
    }
}

impl From<PhraseArgs> for PredicateArgs {
    fn from(args: PhraseArgs) -> Self {
        PredicateArgs::Phrase(args)
    }
}

impl From<PatternArgs> for PredicateArgs {
    fn from(args: PatternArgs) -> Self {
        PredicateArgs::Patterns(args)
    }
}

impl From<RangeArgs> for PredicateArgs {
    fn from(args: RangeArgs) -> Self {
        PredicateArgs::Range(args)
    }
}

impl From<QualityArgs> for PredicateArgs {
    fn from(args: QualityArgs) -> Self {
        PredicateArgs::Quality(args)
    }
}

/// Callback run when a filter leaves the active collection.
#[derive(Clone)]
pub struct RemoveHook(Arc<dyn Fn(&Predicate) + Send + Sync>);

impl RemoveHook {
    pub fn new(f: impl Fn(&Predicate) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, predicate: &Predicate) {
        (self.0)(predicate)
    }
}

impl std::fmt::Debug for RemoveHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RemoveHook(..)")
    }
}

impl PartialEq for RemoveHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Identity of a filter in the active collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateKey {
    pub col_id: String,
    pub kind: PredicateKind,
}

impl PredicateKey {
    pub fn new(col_id: impl Into<String>, kind: PredicateKind) -> Self {
        Self {
            col_id: col_id.into(),
            kind,
        }
    }
}

impl std::fmt::Display for PredicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.kind, self.col_id)
    }
}

/// Value of a filter as shown on its badge.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Criteria(Vec<Criterion>),
    Intervals(Vec<Interval>),
}

impl PredicateValue {
    /// Labels in order.
    pub fn labels(&self) -> Vec<String> {
        match self {
            PredicateValue::Criteria(criteria) => {
                criteria.iter().map(|c| c.label().to_string()).collect()
            }
            PredicateValue::Intervals(intervals) => {
                intervals.iter().map(|i| i.label.clone()).collect()
            }
        }
    }

    /// Element-wise merge identity.
    pub fn same_as(&self, other: &PredicateValue) -> bool {
        match (self, other) {
            (PredicateValue::Criteria(a), PredicateValue::Criteria(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (PredicateValue::Intervals(a), PredicateValue::Intervals(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => false,
        }
    }
}

/// A single filter over one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    #[serde(rename = "type")]
    kind: PredicateKind,
    col_id: String,
    col_name: String,
    editable: bool,
    args: PredicateArgs,
    #[serde(skip)]
    remove_hook: Option<RemoveHook>,
}

impl Predicate {
    /// Create a filter. Fails when `args` do not fit `kind`.
    pub fn new(
        kind: PredicateKind,
        col_id: impl Into<String>,
        col_name: impl Into<String>,
        args: impl Into<PredicateArgs>,
    ) -> Result<Self> {
        let args = args.into();
        args.check(kind)?;
        Ok(Self {
            kind,
            col_id: col_id.into(),
            col_name: col_name.into(),
            editable: kind.default_editable(),
            args,
            remove_hook: None,
        })
    }

    /// Set the editable flag.
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Attach a remove callback.
    pub fn with_remove_hook(mut self, hook: Option<RemoveHook>) -> Self {
        self.remove_hook = hook;
        self
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn col_id(&self) -> &str {
        &self.col_id
    }

    pub fn col_name(&self) -> &str {
        &self.col_name
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn args(&self) -> &PredicateArgs {
        &self.args
    }

    pub(crate) fn args_mut(&mut self) -> &mut PredicateArgs {
        &mut self.args
    }

    pub fn remove_hook(&self) -> Option<&RemoveHook> {
        self.remove_hook.as_ref()
    }

    pub fn key(&self) -> PredicateKey {
        PredicateKey::new(self.col_id.clone(), self.kind)
    }

    /// Run the remove callback, if any.
    pub(crate) fn notify_removed(&self) {
        if let Some(hook) = &self.remove_hook {
            hook.call(self);
        }
    }

    /// Current value: the criteria or intervals, or for QUALITY a single
    /// synthesized criterion carrying the quality label.
    pub fn value(&self) -> PredicateValue {
        match &self.args {
            PredicateArgs::Phrase(args) => PredicateValue::Criteria(args.phrase.clone()),
            PredicateArgs::Patterns(args) => PredicateValue::Criteria(args.patterns.clone()),
            PredicateArgs::Range(args) => PredicateValue::Intervals(args.intervals.clone()),
            PredicateArgs::Quality(args) => {
                PredicateValue::Criteria(vec![Criterion::verbatim(args.label())])
            }
        }
    }

    /// Replace the criteria of a text filter.
    pub fn set_value(&mut self, criteria: Vec<Criterion>) -> Result<()> {
        match &mut self.args {
            PredicateArgs::Phrase(args) => args.phrase = criteria,
            PredicateArgs::Patterns(args) => args.patterns = criteria,
            PredicateArgs::Range(_) => return Err(FilterError::RangeNotSettable),
            PredicateArgs::Quality(_) => return Err(FilterError::NotSettable(self.kind)),
        }
        Ok(())
    }

    /// CSS class of the badge.
    pub fn badge_class(&self) -> String {
        match &self.args {
            PredicateArgs::Quality(q) => {
                let flags = [("valid", q.valid), ("empty", q.empty), ("invalid", q.invalid)];
                flags
                    .iter()
                    .filter(|(_, set)| *set)
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            _ => self.kind.as_str().to_string(),
        }
    }

    /// Check if this is a QUALITY filter on empty records only.
    pub fn is_empty_only_quality(&self) -> bool {
        self.args.quality().is_some_and(|q| q.is_empty_only())
    }

    /// Check if the only criterion of this text filter is the empty marker.
    pub fn has_only_empty_criterion(&self) -> bool {
        matches!(self.args.criteria(), Some([only]) if only.denotes_empty())
    }
}
