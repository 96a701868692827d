//! The table tree
//!
//! Every [`Scope`] lives in a [`ScopeTree`] arena. Table-typed datums hold
//! child handles and each child records its parent, so the tree can be walked
//! in both directions. All structural edits go through the tree, which keeps
//! the two directions consistent: a table has at most one parent, and it
//! appears exactly once among that parent's table entries.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::arena::{Arena, ScopeId};
use crate::attributed::{Attributed, Object, THIS};
use crate::datum::{Datum, DatumType};
use crate::error::{ScopeError, ScopeResult};
use crate::scope::Scope;

pub(crate) struct Node<O: ?Sized> {
    pub scope: Scope,
    pub object: Option<Arc<O>>,
}

impl<O: ?Sized> Node<O> {
    fn new() -> Self {
        Self {
            scope: Scope::new(),
            object: None,
        }
    }
}

impl<O: ?Sized> Clone for Node<O> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.duplicate(),
            object: self.object.clone(),
        }
    }
}

/// Arena of tables, optionally reflecting native objects of type `O`
pub struct ScopeTree<O: ?Sized = dyn Attributed> {
    pub(crate) nodes: Arena<Node<O>>,
    pub(crate) prescribed: HashMap<TypeId, Vec<String>>,
}

impl<O: ?Sized + Object> ScopeTree<O> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            prescribed: HashMap::new(),
        }
    }

    /// Create an empty root table
    pub fn create(&mut self) -> ScopeId {
        let id = self.nodes.insert(Node::new());
        log::trace!("created scope {}", id);
        id
    }

    pub fn contains(&self, id: ScopeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of live tables
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub(crate) fn node(&self, id: ScopeId) -> ScopeResult<&Node<O>> {
        self.nodes.get(id).ok_or(ScopeError::InvalidHandle(id))
    }

    pub(crate) fn node_mut(&mut self, id: ScopeId) -> ScopeResult<&mut Node<O>> {
        self.nodes.get_mut(id).ok_or(ScopeError::InvalidHandle(id))
    }

    pub fn scope(&self, id: ScopeId) -> ScopeResult<&Scope> {
        Ok(&self.node(id)?.scope)
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.nodes.get(id)?.scope.parent()
    }

    /// Parent, grandparent, and so on up to the root
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn is_ancestor(&self, ancestor: ScopeId, id: ScopeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Local lookup only
    pub fn find(&self, id: ScopeId, key: &str) -> Option<&Datum> {
        self.nodes.get(id)?.scope.find(key)
    }

    /// Mutable lookup of a non-table entry. Table entries change only
    /// through [`adopt`](Self::adopt), [`orphan`](Self::orphan) and friends.
    pub fn find_mut(&mut self, id: ScopeId, key: &str) -> Option<&mut Datum> {
        self.nodes
            .get_mut(id)?
            .scope
            .find_mut(key)
            .filter(|datum| datum.datum_type() != DatumType::Table)
    }

    /// Look up `key` in `id` and then in each ancestor, nearest first.
    /// Returns the table that holds the match along with the datum.
    pub fn search(&self, id: ScopeId, key: &str) -> Option<(ScopeId, &Datum)> {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = &self.nodes.get(scope_id)?.scope;
            if let Some(datum) = scope.find(key) {
                return Some((scope_id, datum));
            }
            current = scope.parent();
        }
        None
    }

    /// Entry by insertion position
    pub fn get(&self, id: ScopeId, index: usize) -> ScopeResult<(&str, &Datum)> {
        let scope = self.scope(id)?;
        scope.get(index).ok_or(ScopeError::OutOfBounds {
            index,
            len: scope.len(),
        })
    }

    /// Existing entry for `key`, or a new untyped one. Table entries are
    /// refused like in [`find_mut`](Self::find_mut).
    pub fn append(&mut self, id: ScopeId, key: &str) -> ScopeResult<&mut Datum> {
        let datum = self.slot(id, key)?;
        if datum.datum_type() == DatumType::Table {
            return Err(ScopeError::KeyTypeMismatch {
                key: key.to_string(),
                found: DatumType::Table,
            });
        }
        Ok(datum)
    }

    // unchecked append for the tree's own bookkeeping
    pub(crate) fn slot(&mut self, id: ScopeId, key: &str) -> ScopeResult<&mut Datum> {
        Ok(self.node_mut(id)?.scope.append(key))
    }

    /// Create a new child table under `key`
    pub fn append_scope(&mut self, id: ScopeId, key: &str) -> ScopeResult<ScopeId> {
        self.check_table_slot(id, key)?;
        let child = self.create();
        self.link(id, child, key)?;
        Ok(child)
    }

    fn check_table_slot(&self, id: ScopeId, key: &str) -> ScopeResult<()> {
        match self.scope(id)?.find(key).map(Datum::datum_type) {
            None | Some(DatumType::Unknown) | Some(DatumType::Table) => Ok(()),
            Some(found) => Err(ScopeError::KeyTypeMismatch {
                key: key.to_string(),
                found,
            }),
        }
    }

    // `child` must already be detached
    pub(crate) fn link(&mut self, parent: ScopeId, child: ScopeId, key: &str) -> ScopeResult<()> {
        self.slot(parent, key)?.push_scope(child)?;
        self.node_mut(child)?.scope.set_parent(Some(parent));
        Ok(())
    }

    /// Move `child` under `key` in `parent`, detaching it from its old parent first
    pub fn adopt(&mut self, parent: ScopeId, child: ScopeId, key: &str) -> ScopeResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child {
            return Err(ScopeError::SelfAdoption);
        }
        if self.is_ancestor(child, parent) {
            return Err(ScopeError::Cycle { parent, child });
        }
        self.check_table_slot(parent, key)?;

        if let Some(old) = self.parent(child) {
            self.orphan(old, child)?;
        }
        self.link(parent, child, key)?;
        log::debug!("scope {} adopted {} under '{}'", parent, child, key);
        Ok(())
    }

    /// Detach `child` from `parent` without destroying it
    pub fn orphan(&mut self, parent: ScopeId, child: ScopeId) -> ScopeResult<()> {
        if self.node(child)?.scope.parent() != Some(parent) {
            return Err(ScopeError::NotAChild { parent, child });
        }
        let (position, index) = self
            .locate(parent, child)
            .ok_or(ScopeError::NotAChild { parent, child })?;
        if let Some(datum) = self.node_mut(parent)?.scope.get_mut(position) {
            datum.remove_scope_at(index)?;
        }
        self.node_mut(child)?.scope.set_parent(None);
        log::debug!("scope {} orphaned {}", parent, child);
        Ok(())
    }

    fn locate(&self, parent: ScopeId, child: ScopeId) -> Option<(usize, usize)> {
        let scope = &self.nodes.get(parent)?.scope;
        scope.entries().enumerate().find_map(|(position, (_, datum))| {
            datum
                .find(&child)
                .ok()
                .flatten()
                .map(|index| (position, index))
        })
    }

    /// Key and element index under which `parent` holds `child`
    pub fn find_contained_scope(&self, parent: ScopeId, child: ScopeId) -> Option<(&str, usize)> {
        let (position, index) = self.locate(parent, child)?;
        let (key, _) = self.nodes.get(parent)?.scope.get(position)?;
        Some((key, index))
    }

    /// Key under which `parent` holds `child`
    pub fn find_name(&self, parent: ScopeId, child: ScopeId) -> Option<&str> {
        self.find_contained_scope(parent, child).map(|(key, _)| key)
    }

    /// Every child table, in entry order
    pub fn children(&self, id: ScopeId) -> Vec<ScopeId> {
        self.nodes
            .get(id)
            .map(|node| node.scope.entries().flat_map(|(_, d)| d.scopes()).collect())
            .unwrap_or_default()
    }

    fn snapshot(&self, id: ScopeId) -> ScopeResult<(Vec<(String, Datum)>, Option<Arc<O>>)> {
        let node = self.node(id)?;
        let entries = node
            .scope
            .entries()
            .map(|(k, d)| (k.to_string(), d.duplicate()))
            .collect();
        Ok((entries, node.object.clone()))
    }

    /// Copy `source` and everything below it into a new root table
    pub fn deep_copy(&mut self, source: ScopeId) -> ScopeResult<ScopeId> {
        let (entries, object) = self.snapshot(source)?;
        let copy = self.create();
        self.fill_copy(copy, entries, object)?;
        Ok(copy)
    }

    fn fill_copy(
        &mut self,
        target: ScopeId,
        entries: Vec<(String, Datum)>,
        object: Option<Arc<O>>,
    ) -> ScopeResult<()> {
        for (key, datum) in entries {
            if datum.datum_type() == DatumType::Table {
                self.slot(target, &key)?.set_type(DatumType::Table)?;
                for child in datum.scopes() {
                    let child_copy = self.deep_copy(child)?;
                    self.link(target, child_copy, &key)?;
                }
            } else {
                *self.slot(target, &key)? = datum;
            }
        }
        if let Some(object) = object {
            self.rebind(target, object.duplicate())?;
        }
        Ok(())
    }

    /// Replace the contents of `target` with a deep copy of `source`.
    /// `target` keeps its place in the tree.
    pub fn copy_into(&mut self, target: ScopeId, source: ScopeId) -> ScopeResult<()> {
        if target == source {
            return Ok(());
        }
        if self.is_ancestor(target, source) || self.is_ancestor(source, target) {
            return Err(ScopeError::Cycle {
                parent: target,
                child: source,
            });
        }
        let (entries, object) = self.snapshot(source)?;
        self.clear_contents(target)?;
        self.node_mut(target)?.object = None;
        self.fill_copy(target, entries, object)
    }

    /// Move the contents of `source` into a new table that also takes over
    /// `source`'s place in the tree. `source` is left empty and detached.
    pub fn move_scope(&mut self, source: ScopeId) -> ScopeResult<ScopeId> {
        self.node(source)?;
        let target = self.create();
        self.transfer(target, source)?;
        Ok(target)
    }

    /// Move assignment: `target` is cleared, then takes `source`'s contents
    /// and place in the tree
    pub fn move_into(&mut self, target: ScopeId, source: ScopeId) -> ScopeResult<()> {
        if target == source {
            return Ok(());
        }
        self.node(source)?;
        if self.is_ancestor(target, source) || self.is_ancestor(source, target) {
            return Err(ScopeError::Cycle {
                parent: target,
                child: source,
            });
        }
        self.clear(target)?;
        self.transfer(target, source)
    }

    // `target` must be empty and detached
    fn transfer(&mut self, target: ScopeId, source: ScopeId) -> ScopeResult<()> {
        let (entries, object) = {
            let node = self.node_mut(source)?;
            (node.scope.take_entries(), node.object.take())
        };
        for (_, datum) in &entries {
            for child in datum.scopes() {
                self.node_mut(child)?.scope.set_parent(Some(target));
            }
        }
        {
            let node = self.node_mut(target)?;
            node.scope.set_entries(entries);
            node.object = object;
        }

        if let Some(parent) = self.parent(source) {
            let name = self
                .find_name(parent, source)
                .map(str::to_string)
                .ok_or(ScopeError::NotAChild {
                    parent,
                    child: source,
                })?;
            self.orphan(parent, source)?;
            self.link(parent, target, &name)?;
        }
        Ok(())
    }

    // destroys children and empties entries; parent link untouched
    fn clear_contents(&mut self, id: ScopeId) -> ScopeResult<()> {
        let entries = self.node_mut(id)?.scope.take_entries();
        for (_, datum) in entries {
            for child in datum.scopes() {
                self.remove_subtree(child);
            }
        }
        Ok(())
    }

    fn remove_subtree(&mut self, id: ScopeId) {
        if let Some(node) = self.nodes.remove(id) {
            for (_, datum) in node.scope.entries() {
                for child in datum.scopes() {
                    self.remove_subtree(child);
                }
            }
        }
    }

    /// Detach from the parent, destroy every child, and drop every entry
    pub fn clear(&mut self, id: ScopeId) -> ScopeResult<()> {
        if let Some(parent) = self.parent(id) {
            self.orphan(parent, id)?;
        }
        self.clear_contents(id)
    }

    /// Clear `id` and release its slot. The handle is stale afterwards.
    pub fn destroy(&mut self, id: ScopeId) -> ScopeResult<()> {
        self.clear(id)?;
        self.nodes.remove(id);
        log::debug!("destroyed scope {}", id);
        Ok(())
    }

    /// Key-by-key equality, ignoring entry order and tree position
    pub fn equals(&self, a: ScopeId, b: ScopeId) -> bool {
        let (Some(x), Some(y)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return false;
        };
        x.scope.len() == y.scope.len()
            && x.scope.entries().all(|(key, da)| {
                y.scope
                    .find(key)
                    .map_or(false, |db| self.entry_equals(a, b, key, da, db, false))
            })
    }

    /// Entry-by-entry equality in insertion order, recursing into children
    /// with the same ordered comparison
    pub fn compare_structure(&self, a: ScopeId, b: ScopeId) -> bool {
        let (Some(x), Some(y)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return false;
        };
        x.scope.len() == y.scope.len()
            && x.scope
                .entries()
                .zip(y.scope.entries())
                .all(|((ka, da), (kb, db))| ka == kb && self.entry_equals(a, b, ka, da, db, true))
    }

    fn entry_equals(&self, a: ScopeId, b: ScopeId, key: &str, da: &Datum, db: &Datum, ordered: bool) -> bool {
        if da.datum_type() != db.datum_type() || da.len() != db.len() {
            return false;
        }
        match da.datum_type() {
            DatumType::Table => da.scopes().into_iter().zip(db.scopes()).all(|(x, y)| {
                if ordered {
                    self.compare_structure(x, y)
                } else {
                    self.equals(x, y)
                }
            }),
            // each object points at itself, so compare what they are
            DatumType::Pointer if key == THIS => self.object_type(a) == self.object_type(b),
            _ => da == db,
        }
    }

    fn object_type(&self, id: ScopeId) -> Option<TypeId> {
        let object = self.nodes.get(id)?.object.as_ref()?;
        Some(object.attributed().as_any().type_id())
    }

    /// Concatenated text of every element of every entry, children inlined
    pub fn stringify(&self, id: ScopeId) -> ScopeResult<String> {
        let mut out = String::new();
        for (_, datum) in self.scope(id)?.entries() {
            out.push_str(&self.datum_to_string(datum)?);
        }
        Ok(out)
    }

    pub fn datum_to_string(&self, datum: &Datum) -> ScopeResult<String> {
        if datum.datum_type() == DatumType::Table {
            let mut out = String::new();
            for child in datum.scopes() {
                out.push_str(&self.stringify(child)?);
            }
            return Ok(out);
        }
        let mut out = String::new();
        for i in 0..datum.len() {
            out.push_str(&datum.to_string_at(i)?);
        }
        Ok(out)
    }
}

impl<O: ?Sized + Object> Default for ScopeTree<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized + Object> ScopeTree<O> {
    /// Deep copy of the whole arena. Handles stay valid in the copy and every
    /// reflected object is duplicated and rebound.
    ///
    /// Fails when a duplicated object cannot declare its attributes, for
    /// instance because its copy of an external field is empty.
    pub fn try_clone(&self) -> ScopeResult<Self> {
        let mut copy = self.unbound_copy();
        for (id, object) in copy.reflected() {
            copy.rebind(id, object.duplicate())?;
        }
        Ok(copy)
    }

    fn unbound_copy(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            prescribed: self.prescribed.clone(),
        }
    }

    fn reflected(&self) -> Vec<(ScopeId, Arc<O>)> {
        self.nodes
            .ids()
            .filter_map(|id| Some((id, self.nodes.get(id)?.object.clone()?)))
            .collect()
    }
}

/// Infallible [`ScopeTree::try_clone`]. A table whose object fails to rebind
/// is logged and keeps the source object's attribute views.
impl<O: ?Sized + Object> Clone for ScopeTree<O> {
    fn clone(&self) -> Self {
        let mut copy = self.unbound_copy();
        for (id, object) in copy.reflected() {
            if let Err(err) = copy.rebind(id, object.duplicate()) {
                log::error!("failed to rebind scope {} after clone: {}", id, err);
            }
        }
        copy
    }
}

impl<O: ?Sized> fmt::Debug for ScopeTree<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeTree")
            .field("scopes", &self.nodes.len())
            .field("reflected_types", &self.prescribed.len())
            .finish()
    }
}
