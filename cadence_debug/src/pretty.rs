// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Write errors
//! are ignored; tracing never interrupts a flush.

use std::io::Write;

use cadence_core::task::TaskKind;
use cadence_core::trace::{
    FlushBeginEvent, FlushEndEvent, ResetEvent, TaskSkippedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    idle_flushes: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("idle_flushes", &self.idle_flushes)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            idle_flushes: true,
        }
    }

    /// Whether to print flushes that ran and skipped nothing. On by default;
    /// turn off for hosts that flush every frame.
    #[must_use]
    pub fn idle_flushes(mut self, show: bool) -> Self {
        self.idle_flushes = show;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn kind_name(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Recurring => "recurring",
        TaskKind::OneShot => "one-shot",
        TaskKind::OwnerAction => "owner-action",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        if !self.idle_flushes {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[flush:begin] {} tick={}",
            e.phase.name(),
            e.tick,
        );
    }

    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        let s = &e.summary;
        if !self.idle_flushes && s.one_shots_run == 0 && s.recurring_run == 0 && s.skipped == 0
        {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[flush:end] {} tick={} promoted={} one_shots={} recurring={} skipped={}",
            e.phase.name(),
            e.tick,
            s.promoted,
            s.one_shots_run,
            s.recurring_run,
            s.skipped,
        );
    }

    fn on_task_skipped(&mut self, e: &TaskSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skipped] {} tick={} kind={}",
            e.phase.name(),
            e.tick,
            kind_name(e.kind),
        );
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        let _ = writeln!(
            self.writer,
            "[reset] tick={} discarded={}",
            e.tick, e.discarded,
        );
    }
}

#[cfg(test)]
mod tests {
    use cadence_core::phase::Phase;
    use cadence_core::tick::Tick;
    use cadence_core::trace::FlushSummary;

    use super::*;

    fn end(summary: FlushSummary) -> FlushEndEvent {
        FlushEndEvent {
            phase: Phase::Primary,
            tick: Tick(4),
            summary,
        }
    }

    #[test]
    fn pretty_print_flush() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_flush_begin(&FlushBeginEvent {
            phase: Phase::Primary,
            tick: Tick(4),
        });
        sink.on_flush_end(&end(FlushSummary {
            recurring_run: 3,
            ..FlushSummary::default()
        }));
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[flush:begin] primary tick=4"), "got: {output}");
        assert!(output.contains("recurring=3"), "got: {output}");
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn idle_flushes_can_be_hidden() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).idle_flushes(false);
        sink.on_flush_begin(&FlushBeginEvent {
            phase: Phase::Late,
            tick: Tick(4),
        });
        sink.on_flush_end(&end(FlushSummary::default()));
        sink.on_flush_end(&end(FlushSummary {
            skipped: 1,
            ..FlushSummary::default()
        }));
        sink.on_task_skipped(&TaskSkippedEvent {
            phase: Phase::Primary,
            tick: Tick(4),
            kind: TaskKind::OwnerAction,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 2, "got: {output}");
        assert!(output.contains("kind=owner-action"), "got: {output}");
    }

    #[test]
    fn pretty_print_reset() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_reset(&ResetEvent {
            tick: Tick(9),
            discarded: 5,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[reset] tick=9 discarded=5\n");
    }
}
