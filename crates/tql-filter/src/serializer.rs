//! Serialization of filters to TQL.

use crate::config::FilterConfig;
use crate::dates::local_to_utc_midnight;
use crate::escape::{format_number, quote_literal};
use crate::model::{Criterion, Predicate, PredicateArgs, PredicateKind, QualityArgs, RangeArgs};
use chrono::FixedOffset;

/// Serialize filters with the default configuration.
pub fn to_tql<'a>(filters: impl IntoIterator<Item = &'a Predicate>) -> String {
    to_tql_with(filters, &FilterConfig::default())
}

/// Serialize filters into one TQL expression. Filters are joined with `and`;
/// the criteria of one filter are joined with `or`.
pub fn to_tql_with<'a>(
    filters: impl IntoIterator<Item = &'a Predicate>,
    config: &FilterConfig,
) -> String {
    let offset = config.utc_offset();
    filters
        .into_iter()
        .filter_map(|predicate| predicate_to_tql(predicate, offset))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// TQL of one filter, `None` when it holds no criteria.
fn predicate_to_tql(predicate: &Predicate, offset: FixedOffset) -> Option<String> {
    let col = predicate.col_id();
    let leaves: Vec<String> = match predicate.args() {
        PredicateArgs::Phrase(args) => {
            let operator = match predicate.kind() {
                PredicateKind::Exact => "=",
                _ if args.case_sensitive => "contains",
                _ => "containsIgnoreCase",
            };
            criteria_leaves(col, operator, &args.phrase)
        }
        PredicateArgs::Patterns(args) => {
            let operator = match predicate.kind() {
                PredicateKind::MatchesWords => "wordComplies",
                _ => "complies to",
            };
            criteria_leaves(col, operator, &args.patterns)
        }
        PredicateArgs::Range(args) => range_leaves(col, args, offset),
        PredicateArgs::Quality(args) => vec![quality_leaf(col, args)],
    };

    match leaves.len() {
        0 => None,
        1 => leaves.into_iter().next(),
        _ => Some(format!("({})", leaves.join(" or "))),
    }
}

fn criteria_leaves(col: &str, operator: &str, criteria: &[Criterion]) -> Vec<String> {
    criteria
        .iter()
        .map(|criterion| {
            if criterion.denotes_empty() {
                format!("({col} is empty)")
            } else {
                format!("({col} {operator} {})", quote_literal(&criterion.value))
            }
        })
        .collect()
}

fn range_leaves(col: &str, args: &RangeArgs, offset: FixedOffset) -> Vec<String> {
    let to_tql_bound = |value: f64| {
        if args.column_type.is_date() {
            local_to_utc_midnight(value, offset)
        } else {
            value
        }
    };
    args.intervals
        .iter()
        .map(|interval| {
            let upper = if interval.exclude_max { "<" } else { "<=" };
            format!(
                "({col} >= {} and {col} {upper} {})",
                format_number(to_tql_bound(interval.min())),
                format_number(to_tql_bound(interval.max())),
            )
        })
        .collect()
}

/// Leaves for the set flags, in `valid`, `empty`, `invalid` order. No flag at
/// all reads as `is valid`.
fn quality_leaf(col: &str, args: &QualityArgs) -> String {
    let none_set = !(args.valid || args.empty || args.invalid);
    let leaves: Vec<String> = [
        (args.valid || none_set, "valid"),
        (args.empty, "empty"),
        (args.invalid, "invalid"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, test)| format!("({col} is {test})"))
    .collect();

    match leaves.as_slice() {
        [only] => only.clone(),
        _ => format!("({})", leaves.join(" or ")),
    }
}
