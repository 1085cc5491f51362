// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated host loop that exercises the scheduler and diagnostics pipeline.
//!
//! Runs 30 synthetic frames through the thread-local default scheduler with
//! subscribers on all three phases, one-shot and next-tick work, an owner
//! that goes away with work still queued, and a grouped list refilled under a
//! batch. Events go to both a
//! [`PrettyPrintSink`](cadence_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](cadence_debug::recorder::RecorderSink), and the recording
//! is exported as a Chrome trace JSON file.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use cadence_collections::GroupedList;
use cadence_core::batch::BatchUpdate;
use cadence_core::global;
use cadence_core::phase::Phase;
use cadence_core::scheduler::{Scheduler, SchedulerConfig, TickContext};
use cadence_core::task::{ActionId, OneShotTask, RecurringTask};
use cadence_core::tick::FrameClock;
use cadence_core::trace::{
    FlushBeginEvent, FlushEndEvent, ResetEvent, TaskSkippedEvent, TraceSink,
};

use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 30;
const REFRESH_ACTION: ActionId = ActionId(1);

// -- sinks ---------------------------------------------------------------

/// Forwards every event to a pretty printer and a shared recorder.
struct Fanout {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for Fanout {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        self.pretty.on_flush_begin(e);
        self.recorder.borrow_mut().on_flush_begin(e);
    }

    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        self.pretty.on_flush_end(e);
        self.recorder.borrow_mut().on_flush_end(e);
    }

    fn on_task_skipped(&mut self, e: &TaskSkippedEvent) {
        self.pretty.on_task_skipped(e);
        self.recorder.borrow_mut().on_task_skipped(e);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.pretty.on_reset(e);
        self.recorder.borrow_mut().on_reset(e);
    }
}

// -- widgets -------------------------------------------------------------

/// Primary-phase animation.
struct Spinner {
    angle: u32,
}

impl RecurringTask for Spinner {
    fn run(&mut self, _cx: &mut TickContext<'_>) {
        self.angle = (self.angle + 12) % 360;
    }
}

/// Fixed-rate integrator.
struct Physics {
    steps: u32,
}

impl RecurringTask for Physics {
    fn run(&mut self, _cx: &mut TickContext<'_>) {
        self.steps += 1;
    }
}

/// Late-phase layout pass that stops itself after a number of frames.
struct Settle {
    remaining: u32,
}

impl RecurringTask for Settle {
    fn run(&mut self, cx: &mut TickContext<'_>) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            cx.unregister_self();
            println!("settled at tick {}", cx.tick());
        }
    }
}

/// Shows itself the frame after it was requested.
struct Tooltip {
    shown_at: Vec<u64>,
}

impl OneShotTask for Tooltip {
    fn run_once(&mut self, cx: &mut TickContext<'_>) {
        self.shown_at.push(cx.tick().get());
    }
}

/// A log view backed by a grouped list, keyed by minute.
struct LogView {
    rows: GroupedList<String>,
    next_second: u32,
}

impl LogView {
    fn new() -> Self {
        let mut rows = GroupedList::new(|line: &String| {
            line.get(..5).map_or_else(String::new, str::to_owned)
        });
        rows.set_group_comparison(|a, b| a.cmp(b));
        rows.set_items_per_block(2);
        rows.set_empty_group_item(Some(String::new()));
        rows.set_empty_item(Some(String::from("·")));
        Self {
            rows,
            next_second: 0,
        }
    }

    fn refresh(&mut self, count: u32) {
        let mut rows = self.rows.batch();
        for _ in 0..count {
            let s = self.next_second;
            rows.add(format!("12:{:02}:{:02} event", s / 60, s % 60));
            self.next_second += 17;
        }
    }
}

/// Fixed-rate steps owed for `frame`: the fixed cadence runs 1.5× the frame
/// rate.
fn fixed_steps(frame: u64) -> u64 {
    1 + frame % 2
}

fn main() {
    // -- scheduler ---------------------------------------------------------
    let clock = FrameClock::new();
    let scheduler = Scheduler::with_config(
        clock.clone(),
        SchedulerConfig {
            recurring_capacity: 8,
            ..SchedulerConfig::new()
        },
    );
    global::install(scheduler);

    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    if let Some(scheduler) = global::scheduler() {
        scheduler.set_trace_sink(Fanout {
            pretty: PrettyPrintSink::new(Box::new(std::io::stdout())).idle_flushes(false),
            recorder: recorder.clone(),
        });
    }

    // -- widgets -----------------------------------------------------------
    let spinner = Rc::new(RefCell::new(Spinner { angle: 0 }));
    let physics = Rc::new(RefCell::new(Physics { steps: 0 }));
    let settle = Rc::new(RefCell::new(Settle { remaining: 5 }));
    let tooltip = Rc::new(RefCell::new(Tooltip {
        shown_at: Vec::new(),
    }));
    let log = Rc::new(RefCell::new(LogView::new()));
    let mut toast = Some(Rc::new(RefCell::new(String::from("saved"))));

    let revisions = Rc::new(RefCell::new(0_u32));
    {
        let revisions = revisions.clone();
        log.borrow_mut()
            .rows
            .set_listener(move |_| *revisions.borrow_mut() += 1);
    }

    if let Some(scheduler) = global::scheduler() {
        scheduler.register(&spinner, Phase::Primary);
        scheduler.register(&physics, Phase::Fixed);
        scheduler.register(&settle, Phase::Late);
    }

    // -- simulated loop ----------------------------------------------------
    for frame in 0..FRAME_COUNT {
        let Some(scheduler) = global::scheduler() else {
            break;
        };

        if frame % 7 == 0 {
            scheduler.schedule_next_tick(&tooltip);
        }
        if frame % 10 == 0 {
            // Coalesced: the refresh runs once even if requested twice.
            for _ in 0..2 {
                scheduler.schedule_owner_once(&log, Some(REFRESH_ACTION), |view, _| {
                    view.refresh(6);
                });
            }
        }
        if frame == 12
            && let Some(toast) = toast.take()
        {
            scheduler.schedule_owner_next_tick(&toast, None, |text, cx| {
                println!("toast '{text}' at tick {}", cx.tick());
            });
            // Dismissed before its next-tick action runs; the action is
            // skipped.
        }

        for _ in 0..fixed_steps(frame) {
            scheduler.on_fixed_tick();
        }
        scheduler.on_primary_tick();
        scheduler.on_late_tick();

        clock.advance();
    }

    // -- teardown ----------------------------------------------------------
    let discarded = global::reset();
    // Late cleanup after teardown is a no-op.
    assert!(global::scheduler().is_none());

    println!(
        "spinner={}° physics_steps={} tooltips={:?} log_rows={} log_revisions={} discarded={discarded}",
        spinner.borrow().angle,
        physics.borrow().steps,
        tooltip.borrow().shown_at,
        log.borrow().rows.len(),
        revisions.borrow(),
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    cadence_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}
