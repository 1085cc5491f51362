// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched collections for virtualized widgets.
//!
//! Containers here implement [`cadence_core::batch::BatchUpdate`]: every
//! mutation recomputes their derived output unless a batch is open, in which
//! case the recompute happens once, when the outermost batch closes.
//!
//! **[`grouped`]** — [`GroupedList`], a grouped projection that materializes a
//! flat, block-padded sequence of group keys, items, and sentinel padding.
//!
//! `no_std` compatible (with `alloc`).
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in `cadence_core`.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod grouped;

pub use grouped::GroupedList;
