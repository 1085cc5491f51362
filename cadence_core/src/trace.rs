// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scheduler.
//!
//! This module provides a [`TraceSink`] trait with one method per scheduler
//! event. All method bodies default to no-ops, so implementing only the events
//! you care about is fine.
//!
//! A sink is installed with
//! [`Scheduler::set_trace_sink`](crate::scheduler::Scheduler::set_trace_sink).
//! When the `trace` feature is **off**, the scheduler never calls into the
//! sink and event construction compiles away. When **on**, each emission point
//! costs one `RefCell` borrow and one `Option` branch.
//!
//! [`TraceSink`] is implemented for `Rc<RefCell<S>>`, so a caller can keep a
//! handle to a sink after handing a clone to the scheduler.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): enables dispatch to the installed sink.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::phase::Phase;
use crate::task::TaskKind;
use crate::tick::Tick;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted before a flush does any work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushBeginEvent {
    /// Phase being flushed.
    pub phase: Phase,
    /// Host tick at the start of the flush.
    pub tick: Tick,
}

/// Counts describing one flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Deferred tasks promoted to due-now at the start of the flush.
    pub promoted: usize,
    /// One-shot tasks (objects and owner actions) that ran.
    pub one_shots_run: usize,
    /// Recurring subscribers that ran.
    pub recurring_run: usize,
    /// Entries skipped because their owner or subscriber had been dropped.
    pub skipped: usize,
}

/// Emitted after a flush completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushEndEvent {
    /// Phase that was flushed.
    pub phase: Phase,
    /// Host tick the flush ran in.
    pub tick: Tick,
    /// What the flush did.
    pub summary: FlushSummary,
}

/// Emitted for every entry skipped by the liveness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSkippedEvent {
    /// Phase being flushed.
    pub phase: Phase,
    /// Host tick of the flush.
    pub tick: Tick,
    /// Kind of the skipped entry.
    pub kind: TaskKind,
}

/// Emitted when a scheduler's buckets are cleared by a façade reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetEvent {
    /// Host tick at the time of the reset.
    pub tick: Tick,
    /// Subscribers and pending tasks discarded.
    pub discarded: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scheduler.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about. Sinks must not call back into the
/// scheduler that is emitting to them.
pub trait TraceSink {
    /// Called before a flush does any work.
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        _ = e;
    }

    /// Called after a flush completes.
    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        _ = e;
    }

    /// Called when a dropped owner or subscriber is skipped.
    fn on_task_skipped(&mut self, e: &TaskSkippedEvent) {
        _ = e;
    }

    /// Called when a reset discards the scheduler's contents.
    fn on_reset(&mut self, e: &ResetEvent) {
        _ = e;
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        self.borrow_mut().on_flush_begin(e);
    }

    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        self.borrow_mut().on_flush_end(e);
    }

    fn on_task_skipped(&mut self, e: &TaskSkippedEvent) {
        self.borrow_mut().on_task_skipped(e);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.borrow_mut().on_reset(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Counting {
        begins: Vec<Phase>,
        skipped: usize,
    }

    impl TraceSink for Counting {
        fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
            self.begins.push(e.phase);
        }

        fn on_task_skipped(&mut self, _e: &TaskSkippedEvent) {
            self.skipped += 1;
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_flush_begin(&FlushBeginEvent {
            phase: Phase::Primary,
            tick: Tick(1),
        });
        sink.on_flush_end(&FlushEndEvent {
            phase: Phase::Primary,
            tick: Tick(1),
            summary: FlushSummary::default(),
        });
        sink.on_reset(&ResetEvent {
            tick: Tick(1),
            discarded: 0,
        });
    }

    #[test]
    fn shared_sink_forwards_to_inner() {
        let shared = Rc::new(RefCell::new(Counting::default()));
        let mut handle = shared.clone();
        handle.on_flush_begin(&FlushBeginEvent {
            phase: Phase::Late,
            tick: Tick(0),
        });
        handle.on_task_skipped(&TaskSkippedEvent {
            phase: Phase::Late,
            tick: Tick(0),
            kind: TaskKind::Recurring,
        });
        // Unimplemented events fall through to the default no-op.
        handle.on_reset(&ResetEvent {
            tick: Tick(0),
            discarded: 3,
        });
        assert_eq!(shared.borrow().begins, &[Phase::Late]);
        assert_eq!(shared.borrow().skipped, 1);
    }
}
