//! Slot arena giving population members stable integer ids.

use std::ops::{Index, IndexMut};

/// Stable handle of a member while it stays in its subpopulation.
///
/// Ids of evicted members are recycled, so an id must not be kept once
/// the member is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(usize);

/// Vector of optional slots with a free list.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> MemberId {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                MemberId(slot)
            }
            None => {
                self.slots.push(Some(value));
                MemberId(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: MemberId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: MemberId) -> Option<&T> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: MemberId) -> Option<&mut T> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

impl<T> Index<MemberId> for Arena<T> {
    type Output = T;

    fn index(&self, id: MemberId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale member id {}", id.0),
        }
    }
}

impl<T> IndexMut<MemberId> for Arena<T> {
    fn index_mut(&mut self, id: MemberId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale member id {}", id.0),
        }
    }
}
