//! Ordered string-keyed tables
//!
//! A [`Scope`] keeps its entries in insertion order and indexes them by key.
//! Nesting lives one level up: a Table-typed entry holds [`ScopeId`]s and the
//! [`ScopeTree`](crate::ScopeTree) owning every scope keeps the parent links
//! consistent.

use std::collections::HashMap;

use crate::arena::ScopeId;
use crate::datum::Datum;

/// Cloning a scope keeps its entries, but Table entries come out empty
/// (see [`Datum`]).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    entries: Vec<(String, Datum)>,
    index: HashMap<String, usize>,
    parent: Option<ScopeId>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            parent: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ScopeId>) {
        self.parent = parent;
    }

    /// Local lookup only
    pub fn find(&self, key: &str) -> Option<&Datum> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Datum> {
        let i = *self.index.get(key)?;
        Some(&mut self.entries[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Position of `key` in insertion order
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Existing entry for `key`, or a new untyped one appended at the end
    pub fn append(&mut self, key: &str) -> &mut Datum {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.entries.push((key.to_string(), Datum::new()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// Entry by insertion position
    pub fn get(&self, index: usize) -> Option<(&str, &Datum)> {
        self.entries.get(index).map(|(k, d)| (k.as_str(), d))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Datum> {
        self.entries.get_mut(index).map(|(_, d)| d)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Copy that keeps Table handles
    pub(crate) fn duplicate(&self) -> Scope {
        Scope {
            entries: self
                .entries
                .iter()
                .map(|(k, d)| (k.clone(), d.duplicate()))
                .collect(),
            index: self.index.clone(),
            parent: self.parent,
        }
    }

    /// Take every entry out, leaving the scope empty
    pub(crate) fn take_entries(&mut self) -> Vec<(String, Datum)> {
        self.index.clear();
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn set_entries(&mut self, entries: Vec<(String, Datum)>) {
        self.index = entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
        self.entries = entries;
    }
}
