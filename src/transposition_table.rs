//! Memory of search results keyed by position
//!
//! The search core is generic over [`Memo`], so the plain n-move solver runs
//! with the zero-size [`NoMemo`] and pays nothing for the table it lacks.

use crate::evaluator::Value;

/// How a stored value relates to the true value of the position
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// the true value is at least the stored one (the search failed high)
    Lower,
    /// the true value is at most the stored one (the search failed low)
    Upper,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// remaining depth the value was searched to
    pub depth: u8,
    pub value: Value,
    pub bound: Bound,
    pub best_move: Option<u8>,
}

/// Storage consulted by the search before expanding a node
pub trait Memo {
    fn lookup(&self, key: u64) -> Option<Entry>;
    fn store(&mut self, key: u64, entry: Entry);
}

/// Remembers nothing
#[derive(Copy, Clone, Debug, Default)]
pub struct NoMemo;

impl Memo for NoMemo {
    #[inline(always)]
    fn lookup(&self, _key: u64) -> Option<Entry> {
        None
    }

    #[inline(always)]
    fn store(&mut self, _key: u64, _entry: Entry) {}
}

#[derive(Copy, Clone)]
struct Slot {
    key: u64,
    entry: Entry,
}

/// Number of slots in a default table (~24MB)
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// A direct-mapped table, one slot per index
///
/// A slot is only overwritten by an entry searched at least as deep as the one
/// it holds. The full key is kept, so a lookup never returns another position.
#[derive(Clone)]
pub struct TranspositionTable {
    slots: Vec<Option<Slot>>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
        }
    }

    fn index(&self, key: u64) -> usize {
        // spread neighbouring keys across the table
        let mut h = key.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        h ^= h >> 32;
        (h % self.slots.len() as u64) as usize
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Memo for TranspositionTable {
    fn lookup(&self, key: u64) -> Option<Entry> {
        match self.slots[self.index(key)] {
            Some(slot) if slot.key == key => Some(slot.entry),
            _ => None,
        }
    }

    fn store(&mut self, key: u64, entry: Entry) {
        let i = self.index(key);
        match self.slots[i] {
            Some(slot) if slot.entry.depth > entry.depth => {}
            _ => self.slots[i] = Some(Slot { key, entry }),
        }
    }
}
