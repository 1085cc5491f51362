// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Ticks are cycle numbers, not wall-clock time, so events are laid out on a
//! synthetic timeline: each recorded event advances the clock by one
//! microsecond. Each phase gets its own track (`tid`), and the host tick is
//! kept in `args`.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cadence_core::phase::Phase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Flushes become begin/end slices; skips and resets become instant events.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        match recorded {
            RecordedEvent::FlushBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Flush",
                    "ts": ts,
                    "pid": 0,
                    "tid": track(e.phase),
                    "args": {
                        "tick": e.tick.get(),
                    }
                }));
            }
            RecordedEvent::FlushEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Flush",
                    "ts": ts,
                    "pid": 0,
                    "tid": track(e.phase),
                    "args": {
                        "tick": e.tick.get(),
                        "promoted": e.summary.promoted,
                        "one_shots_run": e.summary.one_shots_run,
                        "recurring_run": e.summary.recurring_run,
                        "skipped": e.summary.skipped,
                    }
                }));
            }
            RecordedEvent::TaskSkipped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "TaskSkipped",
                    "cat": "Liveness",
                    "ts": ts,
                    "pid": 0,
                    "tid": track(e.phase),
                    "s": "t",
                    "args": {
                        "tick": e.tick.get(),
                        "kind": format!("{:?}", e.kind),
                    }
                }));
            }
            RecordedEvent::Reset(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Reset",
                    "cat": "Scheduler",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tick": e.tick.get(),
                        "discarded": e.discarded,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn track(phase: Phase) -> u32 {
    match phase {
        Phase::Primary => 0,
        Phase::Late => 1,
        Phase::Fixed => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use cadence_core::task::TaskKind;
    use cadence_core::tick::Tick;
    use cadence_core::trace::{
        FlushBeginEvent, FlushEndEvent, FlushSummary, ResetEvent, TaskSkippedEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_flush_begin(&FlushBeginEvent {
            phase: Phase::Late,
            tick: Tick(3),
        });
        rec.on_task_skipped(&TaskSkippedEvent {
            phase: Phase::Late,
            tick: Tick(3),
            kind: TaskKind::Recurring,
        });
        rec.on_flush_end(&FlushEndEvent {
            phase: Phase::Late,
            tick: Tick(3),
            summary: FlushSummary {
                recurring_run: 2,
                skipped: 1,
                ..FlushSummary::default()
            },
        });
        rec.on_reset(&ResetEvent {
            tick: Tick(3),
            discarded: 4,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "late");
        assert_eq!(parsed[0]["tid"], 1);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["args"]["kind"], "Recurring");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["args"]["recurring_run"], 2);
        assert_eq!(parsed[2]["ts"], 2);

        assert_eq!(parsed[3]["name"], "Reset");
        assert_eq!(parsed[3]["args"]["discarded"], 4);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
