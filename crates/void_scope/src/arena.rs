//! Generational arena backing the table tree
//!
//! Tables refer to each other by [`ScopeId`]. A handle carries the generation
//! of the slot it was issued for, so a handle to a destroyed table never
//! resolves to whatever table reuses the slot later.

use std::fmt;

/// Handle to a table in a [`ScopeTree`](crate::ScopeTree)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId {
    index: u32,
    generation: u32,
}

impl ScopeId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the raw slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// A vacant cell remembers the generation its next tenant gets and links to
// the next vacant cell, so freed cells are reused most-recent first.
#[derive(Clone)]
enum Cell<T> {
    Live { generation: u32, value: T },
    Vacant { generation: u32, next: Option<u32> },
}

/// Table storage addressed by generation-checked [`ScopeId`]s
#[derive(Clone)]
pub(crate) struct Arena<T> {
    cells: Vec<Cell<T>>,
    vacant: Option<u32>,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            vacant: None,
            live: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> ScopeId {
        self.live += 1;
        let Some(index) = self.vacant else {
            let index = self.cells.len() as u32;
            self.cells.push(Cell::Live { generation: 0, value });
            return ScopeId::new(index, 0);
        };
        let cell = &mut self.cells[index as usize];
        let (generation, next) = match *cell {
            Cell::Vacant { generation, next } => (generation, next),
            Cell::Live { generation, .. } => (generation, None),
        };
        self.vacant = next;
        *cell = Cell::Live { generation, value };
        ScopeId::new(index, generation)
    }

    pub fn remove(&mut self, id: ScopeId) -> Option<T> {
        let cell = self.cells.get_mut(id.index as usize)?;
        if !matches!(cell, Cell::Live { generation, .. } if *generation == id.generation) {
            return None;
        }
        let vacated = Cell::Vacant {
            generation: id.generation.wrapping_add(1),
            next: self.vacant,
        };
        let Cell::Live { value, .. } = std::mem::replace(cell, vacated) else {
            return None;
        };
        self.vacant = Some(id.index);
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, id: ScopeId) -> Option<&T> {
        match self.cells.get(id.index as usize)? {
            Cell::Live { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut T> {
        match self.cells.get_mut(id.index as usize)? {
            Cell::Live { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, id: ScopeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// Handles of every live table, in slot order
    pub fn ids(&self) -> impl Iterator<Item = ScopeId> + '_ {
        (0u32..).zip(&self.cells).filter_map(|(index, cell)| match cell {
            Cell::Live { generation, .. } => Some(ScopeId::new(index, *generation)),
            Cell::Vacant { .. } => None,
        })
    }
}
