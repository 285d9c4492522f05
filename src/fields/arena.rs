//! # Spatial Arena
//!
//! A fixed-layout open-addressing table that maps spatial keys to densely stored
//! items. It backs every sparse volume in the crate: 3D distance chunks, block
//! columns, distance columns and shadow columns.
//!
//! ## Layout
//!
//! - `slots`: power-of-two probe table. `0` marks an empty slot, any other value
//!   is `item index + 1`.
//! - `keys` / `items`: parallel vectors in insertion order.
//!
//! Items are never removed, so iteration follows insertion order for the
//! lifetime of the arena.
//!
//! ## Performance Considerations
//!
//! Lookups hash with a Fibonacci multiplier and probe linearly. The table doubles
//! once it is half full, which keeps probe chains short without the per-entry
//! overhead of a general purpose hash map.

use super::key::SpatialKey;

const INITIAL_SLOTS: usize = 64;

/// Dense storage of `T` addressed by a spatial key `K`.
#[derive(Debug, Clone)]
pub struct SpatialArena<K, T> {
    slots: Vec<u32>,
    keys: Vec<K>,
    items: Vec<T>,
    shift: u32,
}

impl<K: SpatialKey, T> Default for SpatialArena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SpatialKey, T> SpatialArena<K, T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        SpatialArena {
            slots: vec![0; INITIAL_SLOTS],
            keys: Vec::new(),
            items: Vec::new(),
            shift: 64 - INITIAL_SLOTS.trailing_zeros(),
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    fn home_slot(&self, key: K) -> usize {
        (key.hash64() >> self.shift) as usize
    }

    /// Walks the probe chain for `key`.
    ///
    /// # Returns
    /// `Ok(index)` when the key is stored, otherwise `Err(slot)` with the empty
    /// slot where it would be inserted.
    #[inline]
    fn probe(&self, key: K) -> Result<usize, usize> {
        let mask = self.slots.len() - 1;
        let mut slot = self.home_slot(key);
        loop {
            match self.slots[slot] {
                0 => return Err(slot),
                entry => {
                    let index = (entry - 1) as usize;
                    if self.keys[index] == key {
                        return Ok(index);
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
    }

    #[inline]
    fn index_of(&self, key: K) -> Option<usize> {
        self.probe(key).ok()
    }

    /// Returns the item stored under `key`.
    #[inline]
    pub fn get(&self, key: K) -> Option<&T> {
        self.index_of(key).map(|index| &self.items[index])
    }

    /// Returns the item stored under `key` mutably.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        match self.index_of(key) {
            Some(index) => Some(&mut self.items[index]),
            None => None,
        }
    }

    /// Returns the item under `key`, inserting `create()` first if it is missing.
    pub fn get_or_insert_with(&mut self, key: K, create: impl FnOnce() -> T) -> &mut T {
        let index = match self.probe(key) {
            Ok(index) => index,
            Err(slot) => self.insert_at(slot, key, create()),
        };
        &mut self.items[index]
    }

    fn insert_at(&mut self, slot: usize, key: K, item: T) -> usize {
        let index = self.items.len();
        self.keys.push(key);
        self.items.push(item);
        self.slots[slot] = (index + 1) as u32;

        if self.items.len() * 2 > self.slots.len() {
            self.grow();
        }
        index
    }

    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        self.slots = vec![0; capacity];
        self.shift = 64 - capacity.trailing_zeros();

        for (index, key) in self.keys.iter().enumerate() {
            let mask = capacity - 1;
            let mut slot = (key.hash64() >> self.shift) as usize;
            while self.slots[slot] != 0 {
                slot = (slot + 1) & mask;
            }
            self.slots[slot] = (index + 1) as u32;
        }
    }

    /// Iterates `(key, item)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.keys.iter().copied().zip(self.items.iter())
    }

    /// Iterates items mutably in insertion order.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }
}
