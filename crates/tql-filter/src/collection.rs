//! Ordered collection of active filters.

use crate::model::{Predicate, PredicateKey, PredicateKind};
use std::collections::HashMap;

/// Active filters keyed by `(colId, type)`, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FilterCollection {
    entries: HashMap<PredicateKey, Predicate>,
    order: Vec<PredicateKey>,
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &PredicateKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &PredicateKey) -> Option<&Predicate> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &PredicateKey) -> Option<&mut Predicate> {
        self.entries.get_mut(key)
    }

    /// First filter on `col_id` whose type satisfies `accept`.
    pub fn find(
        &self,
        col_id: &str,
        accept: impl Fn(PredicateKind) -> bool,
    ) -> Option<&Predicate> {
        self.iter()
            .find(|p| p.col_id() == col_id && accept(p.kind()))
    }

    /// Filters in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Display position of a filter.
    pub fn position(&self, key: &PredicateKey) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    /// Append a filter. A filter with the same key is replaced in place.
    pub fn push(&mut self, predicate: Predicate) {
        let key = predicate.key();
        if self.entries.insert(key.clone(), predicate).is_none() {
            self.order.push(key);
        }
    }

    /// Detach a filter.
    pub fn remove(&mut self, key: &PredicateKey) -> Option<Predicate> {
        let predicate = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(predicate)
    }

    /// Swap the filter at `old` for `predicate`. With an unchanged key the
    /// display position is kept; otherwise the old filter is dropped and the
    /// new one appended.
    pub fn replace(&mut self, old: &PredicateKey, predicate: Predicate) -> Option<Predicate> {
        let key = predicate.key();
        if &key == old {
            return self.entries.insert(key, predicate);
        }
        let previous = self.remove(old);
        self.push(predicate);
        previous
    }

    /// Detach every filter, in display order.
    pub fn drain(&mut self) -> Vec<Predicate> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .collect()
    }

    /// Clone the filters in display order.
    pub fn to_vec(&self) -> Vec<Predicate> {
        self.iter().cloned().collect()
    }
}

impl FromIterator<Predicate> for FilterCollection {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        let mut collection = FilterCollection::new();
        for predicate in iter {
            collection.push(predicate);
        }
        collection
    }
}
