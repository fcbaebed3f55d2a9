//! Criterion and interval merge algorithms.

use crate::escape::LabelFormat;
use crate::model::{Criterion, Direction, Interval, RangeArgs};
use tracing::debug;

/// Elements that can be toggled in and out of a list by OR-merge.
pub trait OrMergeable: Clone {
    fn same_as(&self, other: &Self) -> bool;
}

impl OrMergeable for Criterion {
    fn same_as(&self, other: &Self) -> bool {
        Criterion::same_as(self, other)
    }
}

impl OrMergeable for Interval {
    fn same_as(&self, other: &Self) -> bool {
        Interval::same_as(self, other)
    }
}

/// OR-merge `new` into `old`: each new element already present is removed,
/// every other one is appended. Returns a fresh list.
pub fn compute_or<T: OrMergeable>(old: &[T], new: &[T]) -> Vec<T> {
    let mut merged = old.to_vec();
    for item in new {
        match merged.iter().position(|existing| existing.same_as(item)) {
            Some(index) => {
                merged.remove(index);
            }
            None => merged.push(item.clone()),
        }
    }
    merged
}

/// Extend a range filter towards each new interval.
///
/// The lower bound of the widest interval or the upper bound of the lowest
/// one moves to absorb the new interval, depending on where it lies and on
/// the direction of the previous extension (downward when none).
pub fn compute_from_to_range(old: &RangeArgs, new: &[Interval], format: &LabelFormat) -> RangeArgs {
    let mut result = old.clone();

    for interval in new {
        let Some((min_index, max_index)) = bound_indexes(&result.intervals) else {
            result.intervals.push(interval.clone());
            continue;
        };

        let global_min = result.intervals[min_index].min();
        let global_max = result.intervals[max_index].max();
        let direction = result.direction.unwrap_or(Direction::Down);

        let extend_up = interval.min() >= global_min
            && ((direction == Direction::Down && interval.max() > global_max)
                || interval.min() > global_max);

        let (index, direction) = if extend_up {
            let target = &mut result.intervals[min_index];
            target.value[1] = interval.max();
            (min_index, Direction::Up)
        } else {
            let target = &mut result.intervals[max_index];
            target.value[0] = interval.min();
            (max_index, Direction::Down)
        };

        let target = &mut result.intervals[index];
        target.exclude_max = interval.exclude_max;
        target.relabel(format);
        result.direction = Some(direction);

        debug!(
            min = target.min(),
            max = target.max(),
            direction = i8::from(direction),
            "Extended range"
        );
    }

    result
}

/// Indexes of the interval with the smallest lower bound and of the one with
/// the largest upper bound. First occurrence wins on ties.
fn bound_indexes(intervals: &[Interval]) -> Option<(usize, usize)> {
    if intervals.is_empty() {
        return None;
    }
    let mut min_index = 0;
    let mut max_index = 0;
    for (index, interval) in intervals.iter().enumerate().skip(1) {
        if interval.min() < intervals[min_index].min() {
            min_index = index;
        }
        if interval.max() > intervals[max_index].max() {
            max_index = index;
        }
    }
    Some((min_index, max_index))
}
