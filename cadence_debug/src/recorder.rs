// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends each scheduler event
//! to a `Vec<u8>` as a tagged little-endian record. [`decode`] reads them
//! back as an iterator of [`RecordedEvent`]. Decoding stops at the first
//! unknown tag or truncated record.
//!
//! Counts are stored as `u64`, so a recording made on one target decodes on
//! any other.

use cadence_core::phase::Phase;
use cadence_core::task::TaskKind;
use cadence_core::tick::Tick;
use cadence_core::trace::{
    FlushBeginEvent, FlushEndEvent, FlushSummary, ResetEvent, TaskSkippedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FLUSH_BEGIN: u8 = 1;
const TAG_FLUSH_END: u8 = 2;
const TAG_TASK_SKIPPED: u8 = 3;
const TAG_RESET: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_phase(&mut self, p: Phase) {
        self.write_u8(match p {
            Phase::Primary => 0,
            Phase::Late => 1,
            Phase::Fixed => 2,
        });
    }

    fn write_kind(&mut self, k: TaskKind) {
        self.write_u8(match k {
            TaskKind::Recurring => 0,
            TaskKind::OneShot => 1,
            TaskKind::OwnerAction => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        self.write_u8(TAG_FLUSH_BEGIN);
        self.write_phase(e.phase);
        self.write_u64(e.tick.get());
    }

    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        self.write_u8(TAG_FLUSH_END);
        self.write_phase(e.phase);
        self.write_u64(e.tick.get());
        self.write_count(e.summary.promoted);
        self.write_count(e.summary.one_shots_run);
        self.write_count(e.summary.recurring_run);
        self.write_count(e.summary.skipped);
    }

    fn on_task_skipped(&mut self, e: &TaskSkippedEvent) {
        self.write_u8(TAG_TASK_SKIPPED);
        self.write_phase(e.phase);
        self.write_u64(e.tick.get());
        self.write_kind(e.kind);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.write_u8(TAG_RESET);
        self.write_u64(e.tick.get());
        self.write_count(e.discarded);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`FlushBeginEvent`].
    FlushBegin(FlushBeginEvent),
    /// A [`FlushEndEvent`].
    FlushEnd(FlushEndEvent),
    /// A [`TaskSkippedEvent`].
    TaskSkipped(TaskSkippedEvent),
    /// A [`ResetEvent`].
    Reset(ResetEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_count(&mut self) -> Option<usize> {
        Some(usize::try_from(self.read_u64()?).unwrap_or(usize::MAX))
    }

    fn read_tick(&mut self) -> Option<Tick> {
        self.read_u64().map(Tick)
    }

    fn read_phase(&mut self) -> Option<Phase> {
        match self.read_u8()? {
            0 => Some(Phase::Primary),
            1 => Some(Phase::Late),
            2 => Some(Phase::Fixed),
            _ => None,
        }
    }

    fn read_kind(&mut self) -> Option<TaskKind> {
        match self.read_u8()? {
            0 => Some(TaskKind::Recurring),
            1 => Some(TaskKind::OneShot),
            2 => Some(TaskKind::OwnerAction),
            _ => None,
        }
    }

    fn decode_flush_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushBegin(FlushBeginEvent {
            phase: self.read_phase()?,
            tick: self.read_tick()?,
        }))
    }

    fn decode_flush_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushEnd(FlushEndEvent {
            phase: self.read_phase()?,
            tick: self.read_tick()?,
            summary: FlushSummary {
                promoted: self.read_count()?,
                one_shots_run: self.read_count()?,
                recurring_run: self.read_count()?,
                skipped: self.read_count()?,
            },
        }))
    }

    fn decode_task_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TaskSkipped(TaskSkippedEvent {
            phase: self.read_phase()?,
            tick: self.read_tick()?,
            kind: self.read_kind()?,
        }))
    }

    fn decode_reset(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reset(ResetEvent {
            tick: self.read_tick()?,
            discarded: self.read_count()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let event = match tag {
            TAG_FLUSH_BEGIN => self.decode_flush_begin(),
            TAG_FLUSH_END => self.decode_flush_end(),
            TAG_TASK_SKIPPED => self.decode_task_skipped(),
            TAG_RESET => self.decode_reset(),
            _ => None, // unknown tag → stop iteration
        };
        if event.is_none() {
            // Malformed record; nothing after it can be trusted.
            self.pos = self.data.len();
        }
        event
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cadence_core::scheduler::{Scheduler, TickContext};
    use cadence_core::task::OneShotTask;
    use cadence_core::tick::FrameClock;

    use super::*;

    fn sample_end() -> FlushEndEvent {
        FlushEndEvent {
            phase: Phase::Late,
            tick: Tick(12),
            summary: FlushSummary {
                promoted: 1,
                one_shots_run: 2,
                recurring_run: 30,
                skipped: 4,
            },
        }
    }

    #[test]
    fn events_decode_in_recording_order() {
        let mut rec = RecorderSink::new();
        rec.on_flush_begin(&FlushBeginEvent {
            phase: Phase::Fixed,
            tick: Tick(12),
        });
        rec.on_task_skipped(&TaskSkippedEvent {
            phase: Phase::Fixed,
            tick: Tick(12),
            kind: TaskKind::OwnerAction,
        });
        rec.on_flush_end(&sample_end());
        rec.on_reset(&ResetEvent {
            tick: Tick(13),
            discarded: 9,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            RecordedEvent::FlushBegin(FlushBeginEvent {
                phase: Phase::Fixed,
                ..
            })
        ));
        match &events[1] {
            RecordedEvent::TaskSkipped(e) => assert_eq!(e.kind, TaskKind::OwnerAction),
            other => panic!("expected TaskSkipped, got {other:?}"),
        }
        assert_eq!(events[2], RecordedEvent::FlushEnd(sample_end()));
        assert_eq!(
            events[3],
            RecordedEvent::Reset(ResetEvent {
                tick: Tick(13),
                discarded: 9,
            })
        );
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_flush_end(&sample_end());
        rec.on_flush_end(&sample_end());
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let events: Vec<_> = decode(&[0xFF, TAG_RESET]).collect();
        assert!(events.is_empty());
        assert!(decode(&[]).next().is_none());
    }

    #[test]
    fn unknown_phase_or_kind_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_task_skipped(&TaskSkippedEvent {
            phase: Phase::Late,
            tick: Tick(5),
            kind: TaskKind::OneShot,
        });
        let good = rec.into_bytes();
        assert_eq!(decode(&good).count(), 1);

        let mut bad_phase = good.clone();
        bad_phase[1] = 9;
        bad_phase.extend_from_slice(&good);
        assert_eq!(decode(&bad_phase).count(), 0, "stops at the bad record");

        let mut bad_kind = good;
        *bad_kind.last_mut().unwrap() = 9;
        assert!(decode(&bad_kind).next().is_none());
    }

    struct Noop;

    impl OneShotTask for Noop {
        fn run_once(&mut self, _cx: &mut TickContext<'_>) {}
    }

    #[test]
    fn records_a_live_scheduler() {
        let clock = FrameClock::new();
        let scheduler = Scheduler::new(clock.clone());
        let rec = Rc::new(RefCell::new(RecorderSink::new()));
        scheduler.set_trace_sink(rec.clone());

        let gone = Rc::new(RefCell::new(Noop));
        let kept = Rc::new(RefCell::new(Noop));
        scheduler.schedule_once(&gone);
        scheduler.schedule_once(&kept);
        drop(gone);
        clock.advance();
        scheduler.flush(Phase::Primary);
        scheduler.clear();

        let events: Vec<_> = decode(rec.borrow().as_bytes()).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::FlushBegin(FlushBeginEvent {
                    phase: Phase::Primary,
                    tick: Tick(1),
                }),
                RecordedEvent::TaskSkipped(TaskSkippedEvent {
                    phase: Phase::Primary,
                    tick: Tick(1),
                    kind: TaskKind::OneShot,
                }),
                RecordedEvent::FlushEnd(FlushEndEvent {
                    phase: Phase::Primary,
                    tick: Tick(1),
                    summary: FlushSummary {
                        promoted: 0,
                        one_shots_run: 1,
                        recurring_run: 0,
                        skipped: 1,
                    },
                }),
                RecordedEvent::Reset(ResetEvent {
                    tick: Tick(1),
                    discarded: 0,
                }),
            ]
        );
    }
}
