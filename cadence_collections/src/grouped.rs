// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grouped, block-padded projection of a flat item list.
//!
//! A [`GroupedList`] buckets items by a derived key and materializes a single
//! flat [`output`](GroupedList::output) sequence for virtualized renderers:
//!
//! ```text
//!   for each non-empty group (sorted by the group comparison, if any):
//!       group key
//!       (k − 1) × empty-group-item        ─┐ header row of k cells
//!       items in bucket order             ─┐
//!       (k − n mod k) mod k × empty-item  ─┘ items padded to a multiple of k
//! ```
//!
//! where `k` is [`items_per_block`](GroupedList::items_per_block). With
//! `k = 1` there is no padding at all.
//!
//! # Missing sentinels
//!
//! Padding needs both sentinel values. Until
//! [`set_empty_group_item`](GroupedList::set_empty_group_item) and
//! [`set_empty_item`](GroupedList::set_empty_item) are both set, the output
//! is built as if `k = 1`: no padding of either kind, rather than a header or
//! tail that leaves items off their block boundaries.
//!
//! # Recompute
//!
//! The output is rebuilt from scratch, O(items + groups), after every
//! mutation. Wrap bulk edits in a [`batch`](BatchUpdate::batch) to rebuild
//! once:
//!
//! ```rust
//! use cadence_collections::GroupedList;
//! use cadence_core::batch::BatchUpdate;
//!
//! let mut list = GroupedList::new(|s: &&'static str| if s.len() < 3 { "short" } else { "long" });
//! {
//!     let mut list = list.batch();
//!     list.add("ab");
//!     list.add("abcd");
//!     list.add("x");
//! }
//! assert_eq!(list.revision(), 1);
//! assert_eq!(list.output(), &["short", "ab", "x", "long", "abcd"]);
//! ```
//!
//! # Group order
//!
//! Without a group comparison, groups are emitted in the order their first
//! item was added. Removing a group keeps the relative order of the others,
//! but a group that is emptied and later refilled moves to the end.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::Hash;

use cadence_core::batch::{BatchState, BatchUpdate};
use hashbrown::HashMap;

type Comparison<T> = Box<dyn Fn(&T, &T) -> Ordering>;

struct Group<T> {
    key: T,
    items: Vec<T>,
}

/// Items bucketed by key, materialized as a flat block-padded sequence.
///
/// Group keys and items share the type `T`, so a key can appear in the
/// output as a header row.
pub struct GroupedList<T> {
    key_of: Box<dyn Fn(&T) -> T>,
    groups: Vec<Group<T>>,
    index: HashMap<T, usize>,
    group_comparison: Option<Comparison<T>>,
    item_comparison: Option<Comparison<T>>,
    items_per_block: usize,
    empty_group_item: Option<T>,
    empty_item: Option<T>,
    len: usize,
    output: Vec<T>,
    batch: BatchState,
    revision: u64,
    listener: Option<Box<dyn FnMut(&[T])>>,
}

impl<T: fmt::Debug> fmt::Debug for GroupedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupedList")
            .field("len", &self.len)
            .field("groups", &self.groups.len())
            .field("items_per_block", &self.items_per_block)
            .field("empty_group_item", &self.empty_group_item)
            .field("empty_item", &self.empty_item)
            .field("batch", &self.batch)
            .field("revision", &self.revision)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Eq + Hash> GroupedList<T> {
    /// Creates an empty list that groups items by `key_of`.
    #[must_use]
    pub fn new(key_of: impl Fn(&T) -> T + 'static) -> Self {
        Self {
            key_of: Box::new(key_of),
            groups: Vec::new(),
            index: HashMap::new(),
            group_comparison: None,
            item_comparison: None,
            items_per_block: 1,
            empty_group_item: None,
            empty_item: None,
            len: 0,
            output: Vec::new(),
            batch: BatchState::new(),
            revision: 0,
            listener: None,
        }
    }

    // -- Mutation --

    /// Adds `item` to the group named by its key, creating the group if
    /// needed. With an item comparison the bucket stays sorted; items that
    /// compare equal keep insertion order.
    pub fn add(&mut self, item: T) {
        self.insert(item);
        self.changed();
    }

    /// Adds every item, recomputing at most once.
    pub fn add_range(&mut self, items: impl IntoIterator<Item = T>) {
        let mut list = self.batch();
        for item in items {
            list.add(item);
        }
    }

    /// Removes the first occurrence of `item`. Returns `false` if it is not
    /// present.
    ///
    /// The item's current key is tried first. If the key has changed since
    /// the item was added, every bucket is scanned, which is O(total items).
    /// Removing the last item of a group removes the group.
    pub fn remove(&mut self, item: &T) -> bool {
        let key = (self.key_of)(item);
        let keyed = self.index.get(&key).copied().and_then(|gi| {
            self.groups[gi]
                .items
                .iter()
                .position(|x| x == item)
                .map(|pos| (gi, pos))
        });
        let found = keyed.or_else(|| {
            self.groups.iter().enumerate().find_map(|(gi, group)| {
                group.items.iter().position(|x| x == item).map(|pos| (gi, pos))
            })
        });
        let Some((gi, pos)) = found else {
            return false;
        };
        self.groups[gi].items.remove(pos);
        self.len -= 1;
        if self.groups[gi].items.is_empty() {
            self.remove_group_at(gi);
        }
        self.changed();
        true
    }

    /// Removes the group `key` and all of its items, returning the items.
    pub fn remove_group(&mut self, key: &T) -> Option<Vec<T>> {
        let gi = self.index.get(key).copied()?;
        let items = self.remove_group_at(gi);
        self.len -= items.len();
        self.changed();
        Some(items)
    }

    /// Removes every group.
    pub fn clear(&mut self) {
        if self.groups.is_empty() {
            return;
        }
        self.groups.clear();
        self.index.clear();
        self.len = 0;
        self.changed();
    }

    // -- Configuration --

    /// Sorts groups by key with `cmp`.
    pub fn set_group_comparison(&mut self, cmp: impl Fn(&T, &T) -> Ordering + 'static) {
        self.group_comparison = Some(Box::new(cmp));
        self.changed();
    }

    /// Returns to insertion order for groups.
    pub fn clear_group_comparison(&mut self) {
        if self.group_comparison.take().is_some() {
            self.changed();
        }
    }

    /// Keeps each bucket sorted with `cmp`. Existing buckets are re-sorted
    /// (stably) right away.
    pub fn set_item_comparison(&mut self, cmp: impl Fn(&T, &T) -> Ordering + 'static) {
        for group in &mut self.groups {
            group.items.sort_by(&cmp);
        }
        self.item_comparison = Some(Box::new(cmp));
        self.changed();
    }

    /// Stops sorting buckets. Existing order is kept; new items append.
    pub fn clear_item_comparison(&mut self) {
        self.item_comparison = None;
    }

    /// Sets the block size `k` the output is padded to.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn set_items_per_block(&mut self, k: usize) {
        assert!(k > 0, "items_per_block must be at least 1");
        if self.items_per_block != k {
            self.items_per_block = k;
            self.changed();
        }
    }

    /// Sets the sentinel that pads a group's header row.
    pub fn set_empty_group_item(&mut self, sentinel: Option<T>) {
        if self.empty_group_item != sentinel {
            self.empty_group_item = sentinel;
            self.changed();
        }
    }

    /// Sets the sentinel that pads a group's items to a block boundary.
    pub fn set_empty_item(&mut self, sentinel: Option<T>) {
        if self.empty_item != sentinel {
            self.empty_item = sentinel;
            self.changed();
        }
    }

    /// Calls `listener` with the new output after every recompute.
    pub fn set_listener(&mut self, listener: impl FnMut(&[T]) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Removes the change listener.
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    // -- Output --

    /// Rebuilds the output now, even inside a batch.
    pub fn update(&mut self) {
        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        if let Some(cmp) = &self.group_comparison {
            let groups = &self.groups;
            order.sort_by(|&a, &b| cmp(&groups[a].key, &groups[b].key));
        }

        let pads = self.empty_group_item.as_ref().zip(self.empty_item.as_ref());
        let k = if pads.is_some() { self.items_per_block } else { 1 };
        self.output.clear();
        for gi in order {
            let group = &self.groups[gi];
            let n = group.items.len();
            if n == 0 {
                continue;
            }
            self.output.push(group.key.clone());
            if let Some((group_pad, _)) = pads {
                self.output
                    .extend(core::iter::repeat_n(group_pad, k - 1).cloned());
            }
            self.output.extend(group.items.iter().cloned());
            if let Some((_, item_pad)) = pads {
                self.output
                    .extend(core::iter::repeat_n(item_pad, (k - n % k) % k).cloned());
            }
        }

        self.revision += 1;
        if let Some(listener) = &mut self.listener {
            listener(&self.output);
        }
    }

    /// The materialized sequence as of the last recompute.
    #[must_use]
    pub fn output(&self) -> &[T] {
        &self.output
    }

    /// Number of recomputes so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -- Introspection --

    /// Number of items, excluding keys and padding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group keys in insertion order.
    pub fn group_keys(&self) -> impl Iterator<Item = &T> {
        self.groups.iter().map(|g| &g.key)
    }

    /// Items of group `key`, in bucket order.
    #[must_use]
    pub fn items_in(&self, key: &T) -> Option<&[T]> {
        self.index
            .get(key)
            .map(|&gi| self.groups[gi].items.as_slice())
    }

    /// Whether `item` is in the group named by its current key.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items_in(&(self.key_of)(item))
            .is_some_and(|items| items.contains(item))
    }

    /// Current block size.
    #[must_use]
    pub fn items_per_block(&self) -> usize {
        self.items_per_block
    }

    /// Whether a batch is open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch.is_batching()
    }

    fn insert(&mut self, item: T) {
        let key = (self.key_of)(&item);
        let gi = match self.index.get(&key) {
            Some(&gi) => gi,
            None => {
                self.groups.push(Group {
                    key: key.clone(),
                    items: Vec::new(),
                });
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        let items = &mut self.groups[gi].items;
        match &self.item_comparison {
            Some(cmp) => {
                let pos = items.partition_point(|x| cmp(x, &item) != Ordering::Greater);
                items.insert(pos, item);
            }
            None => items.push(item),
        }
        self.len += 1;
    }

    fn remove_group_at(&mut self, gi: usize) -> Vec<T> {
        let group = self.groups.remove(gi);
        self.index.remove(&group.key);
        for (offset, later) in self.groups[gi..].iter().enumerate() {
            if let Some(slot) = self.index.get_mut(&later.key) {
                *slot = gi + offset;
            }
        }
        group.items
    }

    fn changed(&mut self) {
        if self.batch.mark_changed() {
            self.update();
        }
    }
}

impl<T: Clone + Eq + Hash> BatchUpdate for GroupedList<T> {
    fn begin_update(&mut self) {
        self.batch.begin();
    }

    fn end_update(&mut self) {
        if self.batch.end() {
            self.update();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::{Cell, RefCell};

    use super::*;

    const EMPTY_GROUP: u32 = 9_998;
    const EMPTY_ITEM: u32 = 9_999;

    fn by_letter() -> GroupedList<&'static str> {
        GroupedList::new(|s: &&'static str| match *s {
            "1" | "2" => "A",
            "3" => "B",
            _ => "?",
        })
    }

    #[test]
    fn groups_sorted_by_key() {
        let mut list = by_letter();
        list.add("3");
        list.add("1");
        list.add("2");
        list.set_group_comparison(|a, b| a.cmp(b));
        assert_eq!(list.output(), &["A", "1", "2", "B", "3"]);
    }

    #[test]
    fn groups_default_to_insertion_order() {
        let mut list = by_letter();
        list.add_range(["3", "1", "2"]);
        assert_eq!(list.output(), &["B", "3", "A", "1", "2"]);
        assert_eq!(list.group_keys().copied().collect::<Vec<_>>(), vec!["B", "A"]);

        list.clear_group_comparison();
        assert_eq!(list.revision(), 1, "nothing to clear");
    }

    #[test]
    fn padding_law_holds_for_every_block_size() {
        for k in 1..=4_usize {
            for n in 1..=7_u32 {
                let mut list = GroupedList::new(|_: &u32| 1_000_u32);
                list.set_items_per_block(k);
                list.set_empty_group_item(Some(EMPTY_GROUP));
                list.set_empty_item(Some(EMPTY_ITEM));
                list.add_range(1..=n);

                let n = n as usize;
                let out = list.output();
                let expected = 1 + (k - 1) + n + (k - n % k) % k;
                assert_eq!(out.len(), expected, "k = {k}, n = {n}");
                assert_eq!(out[0], 1_000);
                assert!(out[1..k].iter().all(|&x| x == EMPTY_GROUP));
                assert_eq!(out[k..k + n], (1..=n as u32).collect::<Vec<_>>());
                assert!(out[k + n..].iter().all(|&x| x == EMPTY_ITEM));
                assert_eq!((out.len() - k) % k, 0, "items end on a block boundary");
            }
        }
    }

    #[test]
    fn padding_applies_per_group() {
        let mut list = GroupedList::new(|n: &u32| n / 10 * 10 + 1_000);
        list.set_items_per_block(2);
        list.set_empty_group_item(Some(EMPTY_GROUP));
        list.set_empty_item(Some(EMPTY_ITEM));
        list.add_range([1, 2, 3, 11]);
        assert_eq!(
            list.output(),
            &[
                1_000, EMPTY_GROUP, 1, 2, 3, EMPTY_ITEM, //
                1_010, EMPTY_GROUP, 11, EMPTY_ITEM,
            ]
        );
    }

    #[test]
    fn missing_sentinels_omit_padding() {
        let mut list = GroupedList::new(|_: &&'static str| "2024-01-01");
        list.set_items_per_block(2);
        list.add_range(["a", "b", "c"]);
        assert_eq!(list.output(), &["2024-01-01", "a", "b", "c"]);

        // One sentinel alone would misalign the blocks.
        list.set_empty_item(Some("-"));
        list.add("d");
        assert_eq!(list.output(), &["2024-01-01", "a", "b", "c", "d"]);

        list.set_empty_group_item(Some("+"));
        assert_eq!(list.output(), &["2024-01-01", "+", "a", "b", "c", "d"]);
        assert!(list.remove(&"d"));
        assert_eq!(list.output(), &["2024-01-01", "+", "a", "b", "c", "-"]);
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_block_size_panics() {
        let mut list = by_letter();
        list.set_items_per_block(0);
    }

    #[test]
    fn batch_recomputes_once_and_notifies_once() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list = by_letter();
        let (c, s) = (calls.clone(), seen.clone());
        list.set_listener(move |out| {
            c.set(c.get() + 1);
            *s.borrow_mut() = out.to_vec();
        });

        {
            let mut list = list.batch();
            list.add("1");
            list.add("3");
            list.remove(&"1");
            list.add("2");
            assert!(list.output().is_empty(), "no recompute inside the batch");
        }
        assert_eq!(list.revision(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(*seen.borrow(), vec!["B", "3", "A", "2"]);
    }

    #[test]
    fn nested_batches_recompute_at_outermost_close() {
        let mut list = by_letter();
        list.begin_update();
        list.add("1");
        {
            let mut inner = list.batch();
            inner.add("2");
        }
        assert_eq!(list.revision(), 0, "inner close must not recompute");
        assert!(list.is_batching());
        list.end_update();
        assert_eq!(list.revision(), 1);
        assert_eq!(list.output(), &["A", "1", "2"]);
    }

    #[test]
    fn update_forces_recompute_inside_batch() {
        let mut list = by_letter();
        let mut scope = list.batch();
        scope.add("1");
        scope.update();
        assert_eq!(scope.output(), &["A", "1"]);
        drop(scope);
        assert_eq!(list.revision(), 2, "the batch still recomputes on close");
    }

    #[test]
    fn remove_falls_back_to_scan_when_key_changed() {
        let shift = Rc::new(Cell::new(0_u32));
        let key_shift = shift.clone();
        let mut list = GroupedList::new(move |n: &u32| 1_000 + key_shift.get() + n % 2);
        list.add_range([1, 2, 3]);
        assert_eq!(list.group_count(), 2);

        shift.set(50);
        assert!(!list.contains(&1), "key lookup misses after the key changes");
        assert!(list.remove(&1));
        assert!(list.remove(&3));
        assert_eq!(list.group_count(), 1, "emptied group is removed");
        assert_eq!(list.output(), &[1_000, 2]);
        assert!(!list.remove(&7));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_group_and_clear() {
        let mut list = by_letter();
        list.add_range(["1", "3", "2"]);
        assert_eq!(list.remove_group(&"A"), Some(vec!["1", "2"]));
        assert_eq!(list.remove_group(&"A"), None);
        assert_eq!(list.len(), 1);
        assert_eq!(list.items_in(&"B"), Some(&["3"][..]));
        assert_eq!(list.output(), &["B", "3"]);

        list.clear();
        assert!(list.is_empty());
        assert!(list.output().is_empty());
        let revision = list.revision();
        list.clear();
        assert_eq!(list.revision(), revision);
    }

    #[test]
    fn surviving_groups_keep_their_order_and_index() {
        let mut list = GroupedList::new(|n: &u32| n / 10 * 10);
        list.add_range([5, 15, 25, 35]);
        assert!(list.remove(&15));
        assert_eq!(list.output(), &[0, 5, 20, 25, 30, 35]);
        assert_eq!(list.items_in(&30), Some(&[35][..]));
        assert!(list.contains(&25));
        assert!(list.remove(&35));
        assert_eq!(list.group_count(), 2);
    }

    #[test]
    fn item_comparison_keeps_buckets_sorted() {
        let mut list = GroupedList::new(|n: &u32| n / 10 * 10 + 1_000);
        list.add_range([3, 1, 2]);
        assert_eq!(list.items_in(&1_000), Some(&[3, 1, 2][..]));

        list.set_item_comparison(|a, b| a.cmp(b));
        assert_eq!(list.items_in(&1_000), Some(&[1, 2, 3][..]), "re-sorted");
        list.add(0);
        list.add(5);
        assert_eq!(list.output(), &[1_000, 0, 1, 2, 3, 5]);

        list.set_item_comparison(|a, b| b.cmp(a));
        list.add(4);
        assert_eq!(list.output(), &[1_000, 5, 4, 3, 2, 1, 0]);
    }
}
