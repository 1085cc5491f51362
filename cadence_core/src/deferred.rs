// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Next-tick bucket.
//!
//! A [`DeferredBucket`] holds items that must not run before the host tick
//! after the one in which they were added. It records the tick at which its
//! contents become due; every [`add`](DeferredBucket::add) and explicit
//! [`check`](DeferredBucket::check) compares that against the current tick
//! and, once reached, moves the whole contents into the caller's due-now list
//! and re-arms for `now + 1`.
//!
//! An item added during tick `T` is therefore promoted no earlier than tick
//! `T + 1`, and no later than the first check made during `T + 1`.

use alloc::vec::Vec;

use crate::tick::Tick;

#[derive(Debug)]
pub(crate) struct DeferredBucket<T> {
    items: Vec<T>,
    due: Tick,
}

impl<T> DeferredBucket<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            due: Tick::ZERO,
        }
    }

    /// Moves every item into `due_now` if `now` has reached the due tick.
    /// Returns the number of items moved.
    pub(crate) fn check(&mut self, now: Tick, due_now: &mut Vec<T>) -> usize {
        if now < self.due {
            return 0;
        }
        let moved = self.items.len();
        due_now.append(&mut self.items);
        self.due = now.next();
        moved
    }

    /// Checks for promotion, then defers `item` to the next tick.
    pub(crate) fn add(&mut self, item: T, now: Tick, due_now: &mut Vec<T>) -> usize {
        let moved = self.check(now, due_now);
        self.items.push(item);
        moved
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Removes every item for which `matches` returns `true`; returns how
    /// many were removed.
    pub(crate) fn remove_where(&mut self, mut matches: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !matches(item));
        before - self.items.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Drops every item. The due tick is left alone so the epoch rule still
    /// holds for items added afterwards.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}
