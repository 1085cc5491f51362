// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-ordered set with idempotent insertion.
//!
//! Entries live in a slot vector so iteration follows insertion order; a hash
//! index maps each key to its slot. Removal leaves a tombstone that is
//! reclaimed once tombstones outnumber live entries, keeping removal O(1)
//! amortized without disturbing the order of the survivors.
//!
//! Iteration never observes the live set while callbacks run: the scheduler
//! copies the entries out with [`OrderedSet::snapshot_into`] first.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

/// Tombstones below this count are never compacted.
const MIN_COMPACT: usize = 8;

#[derive(Debug)]
pub(crate) struct OrderedSet<K, V> {
    slots: Vec<Option<(K, V)>>,
    index: HashMap<K, usize>,
    tombstones: usize,
}

impl<K: Copy + Eq + Hash, V> OrderedSet<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            tombstones: 0,
        }
    }

    /// Inserts `value` under `key`. Returns `false` (and keeps the existing
    /// entry and its position) if `key` is already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.slots.len());
        self.slots.push(Some((key, value)));
        true
    }

    /// Removes `key`, returning its value if it was present.
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.slots[slot].take()?;
        self.tombstones += 1;
        if self.tombstones >= MIN_COMPACT && self.tombstones > self.index.len() {
            self.compact();
        }
        Some(value)
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.tombstones = 0;
    }

    /// Iterates live entries in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(k, v)| (k, v)))
    }

    /// Appends a copy of every live entry, in insertion order, to `out`.
    pub(crate) fn snapshot_into(&self, out: &mut Vec<(K, V)>)
    where
        V: Clone,
    {
        out.extend(self.iter().map(|(k, v)| (*k, v.clone())));
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some((key, _)) = slot {
                self.index.insert(*key, i);
            }
        }
        self.tombstones = 0;
    }
}
