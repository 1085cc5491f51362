// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase-driven update scheduling for retained-mode widgets.
//!
//! `cadence_core` replaces per-object "run every frame" callbacks with a
//! central dispatcher. Widgets register with a [`Scheduler`](scheduler::Scheduler)
//! instead of polling, and the host calls one flush per cadence per frame. It
//! is `no_std` compatible (with `alloc`) and single-threaded by construction:
//! handles are `Rc`-based and deliberately `!Send`.
//!
//! # Architecture
//!
//! ```text
//!   Host frame loop (tick source)
//!       │
//!       ├──► on_fixed_tick()   ──► Fixed recurring set
//!       │
//!       ├──► on_primary_tick() ──► promote deferred ──► one-shots ──► Primary set
//!       │
//!       └──► on_late_tick()    ──► Late recurring set
//! ```
//!
//! **[`scheduler`]** — The [`Scheduler`](scheduler::Scheduler) handle, its
//! queues, and the [`TickContext`](scheduler::TickContext) passed to every
//! callback.
//!
//! **[`task`]** — The [`RecurringTask`](task::RecurringTask) and
//! [`OneShotTask`](task::OneShotTask) traits, owner/action pairs, and
//! allocation-identity keys. Everything is held weakly.
//!
//! **[`phase`]** — The three update cadences.
//!
//! **[`tick`]** — Host tick counter and the [`TickSource`](tick::TickSource)
//! trait that next-tick scheduling reads.
//!
//! **[`facade`]** — A resettable, lazily created slot for the application's
//! scheduler core.
//!
//! **[`batch`]** — The [`BatchUpdate`](batch::BatchUpdate) protocol that lets
//! containers coalesce many mutations into one recompute.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! flush instrumentation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables the thread-local default scheduler
//!   in `global`.
//! - `trace` (disabled by default): Enables dispatch to the installed trace
//!   sink (one branch per emission point).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod batch;
mod deferred;
pub mod facade;
#[cfg(feature = "std")]
pub mod global;
mod ordered_set;
pub mod phase;
pub mod scheduler;
pub mod task;
pub mod tick;
pub mod trace;
