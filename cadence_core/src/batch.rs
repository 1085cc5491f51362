// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactional batch-update protocol.
//!
//! A container implementing [`BatchUpdate`] lets callers bracket many
//! mutations so that the container recomputes its derived state (and notifies
//! listeners) once at the end instead of after every edit.
//!
//! Scopes nest: [`BatchState`] counts depth, and only closing the outermost
//! scope recomputes. A scope in which nothing changed recomputes nothing.
//!
//! ```rust,ignore
//! {
//!     let mut list = list.batch();
//!     for row in rows {
//!         list.add(row);
//!     }
//! } // recomputed once here
//! ```

use core::ops::{Deref, DerefMut};

/// A mutable container that can coalesce mutations.
pub trait BatchUpdate {
    /// Opens a batch. Must be paired with [`end_update`](Self::end_update).
    fn begin_update(&mut self);

    /// Closes a batch; recomputes if this closed the outermost batch and a
    /// change was recorded inside it.
    fn end_update(&mut self);

    /// Opens a batch that closes when the returned scope is dropped.
    fn batch(&mut self) -> UpdateScope<'_, Self> {
        self.begin_update();
        UpdateScope { target: self }
    }
}

/// Scoped batch token; derefs to the container and calls
/// [`end_update`](BatchUpdate::end_update) on drop.
#[derive(Debug)]
pub struct UpdateScope<'a, B: BatchUpdate + ?Sized> {
    target: &'a mut B,
}

impl<B: BatchUpdate + ?Sized> Deref for UpdateScope<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.target
    }
}

impl<B: BatchUpdate + ?Sized> DerefMut for UpdateScope<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.target
    }
}

impl<B: BatchUpdate + ?Sized> Drop for UpdateScope<'_, B> {
    fn drop(&mut self) {
        self.target.end_update();
    }
}

/// Depth-counted bookkeeping for [`BatchUpdate`] implementors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchState {
    depth: u32,
    pending: bool,
}

impl BatchState {
    /// Creates a state with no open batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            depth: 0,
            pending: false,
        }
    }

    /// Records that a batch was opened.
    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Records that a batch was closed. Returns `true` if the caller should
    /// recompute now.
    ///
    /// # Panics
    ///
    /// Panics if no batch is open.
    pub fn end(&mut self) -> bool {
        assert!(
            self.depth > 0,
            "end_update called without a matching begin_update"
        );
        self.depth -= 1;
        if self.depth == 0 && self.pending {
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// Records a change. Returns `true` if the caller should recompute now,
    /// i.e. no batch is open.
    pub fn mark_changed(&mut self) -> bool {
        if self.depth > 0 {
            self.pending = true;
            false
        } else {
            true
        }
    }

    /// Whether a batch is open.
    #[must_use]
    pub const fn is_batching(&self) -> bool {
        self.depth > 0
    }

    /// Number of open batches.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether a change has been recorded in the open batch.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending
    }
}
