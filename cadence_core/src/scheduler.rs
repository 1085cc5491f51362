// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Central update dispatcher.
//!
//! The [`Scheduler`] replaces per-object "run every frame" callbacks with a
//! handful of centrally owned queues:
//!
//! - one insertion-ordered set of [`RecurringTask`]s per [`Phase`];
//! - a due-now list and a [next-tick bucket](crate::deferred) for one-shot
//!   task objects ([`OneShotTask`]);
//! - the same pair for owner/action pairs ([`OwnerAction`]).
//!
//! # Flush order
//!
//! [`flush(Phase::Primary)`](Scheduler::flush) first promotes deferred tasks
//! whose tick has come, then runs and clears the due one-shot tasks (objects
//! before owner actions, each in append order), then runs the primary
//! recurring set in registration order. [`Phase::Late`] and [`Phase::Fixed`]
//! flushes only run their recurring set. Ordering between phases belongs to
//! the host.
//!
//! # Re-entrancy
//!
//! No internal borrow is held while a callback runs. Due one-shot tasks are
//! taken out of their list, and the recurring set is copied into a scratch
//! buffer before anything is invoked, so callbacks may freely register,
//! unregister, schedule, or cancel. Changes made during a flush take effect
//! from the next flush: a subscriber that unregisters itself still finishes
//! the current one, and a one-shot task scheduled from a callback waits for
//! the next primary flush.
//!
//! # Liveness
//!
//! Subscribers, task objects, and owners are held weakly. An entry whose
//! target has been dropped is skipped without error and, for one-shot
//! entries, discarded. Panics raised by callbacks are not caught.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::mem;

use crate::deferred::DeferredBucket;
use crate::ordered_set::OrderedSet;
use crate::phase::{PHASE_COUNT, Phase};
use crate::task::{
    ActionId, OneShotTask, OwnerAction, PendingTask, PlainTask, RecurringTask, TaskKey, TaskKind,
};
use crate::tick::{Tick, TickSource};
use crate::trace::{
    FlushBeginEvent, FlushEndEvent, FlushSummary, ResetEvent, TaskSkippedEvent, TraceSink,
};

type RecurringRef = Weak<RefCell<dyn RecurringTask>>;

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Initial capacity of each phase's recurring set.
    pub recurring_capacity: usize,
    /// Initial capacity of each one-shot list and next-tick bucket.
    pub one_shot_capacity: usize,
}

impl SchedulerConfig {
    /// Default sizing for a typical widget tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            recurring_capacity: 64,
            one_shot_capacity: 16,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Execution context handed to every callback.
pub struct TickContext<'a> {
    scheduler: &'a Scheduler,
    phase: Phase,
    tick: Tick,
    key: TaskKey,
}

impl<'a> TickContext<'a> {
    /// The scheduler running this callback.
    #[must_use]
    pub fn scheduler(&self) -> &'a Scheduler {
        self.scheduler
    }

    /// Phase being flushed.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Host tick of the flush.
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Identity of the running subscriber, task object, or owner.
    #[must_use]
    pub fn key(&self) -> TaskKey {
        self.key
    }

    /// Unregisters the running subscriber from the phase being flushed.
    ///
    /// The current invocation completes normally; the subscriber is not run
    /// again from the next flush on. Returns `false` if it was not registered
    /// (for example when called from a one-shot task).
    pub fn unregister_self(&self) -> bool {
        self.scheduler.unregister(self.key, self.phase)
    }
}

impl fmt::Debug for TickContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickContext")
            .field("phase", &self.phase)
            .field("tick", &self.tick)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// All queues, behind one `RefCell`.
struct Buckets {
    recurring: [OrderedSet<TaskKey, RecurringRef>; PHASE_COUNT],
    once: Vec<PlainTask>,
    once_deferred: DeferredBucket<PlainTask>,
    owner_once: Vec<OwnerAction>,
    owner_deferred: DeferredBucket<OwnerAction>,
    /// Reused between flushes to snapshot a recurring set.
    scratch: Vec<(TaskKey, RecurringRef)>,
}

impl Buckets {
    fn new(config: &SchedulerConfig) -> Self {
        Self {
            recurring: core::array::from_fn(|_| {
                OrderedSet::with_capacity(config.recurring_capacity)
            }),
            once: Vec::with_capacity(config.one_shot_capacity),
            once_deferred: DeferredBucket::with_capacity(config.one_shot_capacity),
            owner_once: Vec::with_capacity(config.one_shot_capacity),
            owner_deferred: DeferredBucket::with_capacity(config.one_shot_capacity),
            scratch: Vec::with_capacity(config.recurring_capacity),
        }
    }

    fn promote(&mut self, now: Tick) -> usize {
        self.once_deferred.check(now, &mut self.once)
            + self.owner_deferred.check(now, &mut self.owner_once)
    }

    fn take_due(&mut self) -> Vec<PendingTask> {
        let mut due = Vec::with_capacity(self.once.len() + self.owner_once.len());
        due.extend(self.once.drain(..).map(PendingTask::Plain));
        due.extend(self.owner_once.drain(..).map(PendingTask::Owned));
        due
    }

    fn pending_len(&self) -> usize {
        self.once.len() + self.once_deferred.len() + self.owner_once.len() + self.owner_deferred.len()
    }

    fn clear(&mut self) -> usize {
        let discarded =
            self.pending_len() + self.recurring.iter().map(OrderedSet::len).sum::<usize>();
        for set in &mut self.recurring {
            set.clear();
        }
        self.once.clear();
        self.once_deferred.clear();
        self.owner_once.clear();
        self.owner_deferred.clear();
        discarded
    }
}

struct Shared {
    buckets: RefCell<Buckets>,
    clock: Box<dyn TickSource>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

/// Handle to a scheduler core.
///
/// Cloning is cheap and every clone refers to the same queues; pass a clone to
/// each widget that needs one. All operations take `&self`, and none of them
/// fail: registering twice, unregistering something absent, or cancelling
/// something that is not pending are no-ops reported through the return
/// value.
#[derive(Clone)]
pub struct Scheduler {
    shared: Rc<Shared>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buckets = self.shared.buckets.try_borrow();
        let mut s = f.debug_struct("Scheduler");
        s.field("now", &self.now());
        if let Ok(b) = buckets {
            s.field("primary", &b.recurring[Phase::Primary.index()].len())
                .field("late", &b.recurring[Phase::Late.index()].len())
                .field("fixed", &b.recurring[Phase::Fixed.index()].len())
                .field("pending", &b.pending_len());
        }
        s.finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler reading ticks from `clock`.
    #[must_use]
    pub fn new(clock: impl TickSource + 'static) -> Self {
        Self::with_config(clock, SchedulerConfig::new())
    }

    /// Creates a scheduler with explicit sizing.
    #[must_use]
    pub fn with_config(clock: impl TickSource + 'static, config: SchedulerConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                buckets: RefCell::new(Buckets::new(&config)),
                clock: Box::new(clock),
                sink: RefCell::new(None),
            }),
        }
    }

    /// Current host tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.shared.clock.now()
    }

    /// Whether `self` and `other` are handles to the same core.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Installs a trace sink, returning the previous one.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) -> Option<Box<dyn TraceSink>> {
        self.shared.sink.borrow_mut().replace(Box::new(sink))
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.shared.sink.borrow_mut().take()
    }

    // -- Recurring subscribers --

    /// Registers `subscriber` to run on every flush of `phase`.
    ///
    /// Returns `false` if it was already registered for that phase; it still
    /// runs once per flush and keeps its original position.
    pub fn register<T: RecurringTask + 'static>(
        &self,
        subscriber: &Rc<RefCell<T>>,
        phase: Phase,
    ) -> bool {
        let weak = Rc::downgrade(subscriber);
        let weak: RecurringRef = weak;
        let key = TaskKey::of_weak(&weak);
        self.shared.buckets.borrow_mut().recurring[phase.index()].insert(key, weak)
    }

    /// Removes the subscriber identified by `key` from `phase`.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister(&self, key: TaskKey, phase: Phase) -> bool {
        self.shared.buckets.borrow_mut().recurring[phase.index()]
            .remove(&key)
            .is_some()
    }

    /// Removes the subscriber identified by `key` from every phase. Returns
    /// the number of phases it was removed from.
    pub fn unregister_all(&self, key: TaskKey) -> usize {
        let mut buckets = self.shared.buckets.borrow_mut();
        buckets
            .recurring
            .iter_mut()
            .filter_map(|set| set.remove(&key))
            .count()
    }

    /// Whether `key` is registered for `phase`.
    #[must_use]
    pub fn is_registered(&self, key: TaskKey, phase: Phase) -> bool {
        self.shared.buckets.borrow().recurring[phase.index()].contains(&key)
    }

    /// Number of subscribers registered for `phase`. Dropped subscribers are
    /// pruned the next time their phase is flushed.
    #[must_use]
    pub fn recurring_len(&self, phase: Phase) -> usize {
        self.shared.buckets.borrow().recurring[phase.index()].len()
    }

    // -- One-shot task objects --

    /// Schedules `task` to run once on the next primary flush.
    ///
    /// Returns `false` if the same object is already waiting for that flush.
    pub fn schedule_once<T: OneShotTask + 'static>(&self, task: &Rc<RefCell<T>>) -> bool {
        let task = PlainTask::new(task);
        let mut buckets = self.shared.buckets.borrow_mut();
        if buckets.once.iter().any(|t| t.key == task.key) {
            return false;
        }
        buckets.once.push(task);
        true
    }

    /// Schedules `task` to run once on the first primary flush of a later
    /// tick than the current one.
    ///
    /// Returns `false` if the same object is already deferred.
    pub fn schedule_next_tick<T: OneShotTask + 'static>(&self, task: &Rc<RefCell<T>>) -> bool {
        let task = PlainTask::new(task);
        let now = self.now();
        let mut buckets = self.shared.buckets.borrow_mut();
        let Buckets {
            once,
            once_deferred,
            ..
        } = &mut *buckets;
        // Promote first so a stale entry does not shadow the new one.
        once_deferred.check(now, once);
        if once_deferred.iter().any(|t| t.key == task.key) {
            return false;
        }
        once_deferred.add(task, now, once);
        true
    }

    /// Cancels every pending run of the task object identified by `key`,
    /// immediate or deferred. Returns the number of entries removed.
    ///
    /// Work already taken by a primary flush in progress is not affected: a
    /// one-shot callback that cancels another task due in the same flush
    /// gets `0` back and that task still runs.
    pub fn cancel(&self, key: TaskKey) -> usize {
        let mut buckets = self.shared.buckets.borrow_mut();
        let before = buckets.once.len();
        buckets.once.retain(|t| t.key != key);
        let removed = before - buckets.once.len();
        removed + buckets.once_deferred.remove_where(|t| t.key == key)
    }

    // -- Owner actions --

    /// Schedules an owner action to run once on the next primary flush.
    ///
    /// Rejected (returning `false`) if the same task, by the rule on
    /// [`OwnerAction`], is already waiting for that flush: an action with an
    /// equal [`ActionId`], or any action for the same owner when either side
    /// has no id.
    pub fn schedule_action_once(&self, action: OwnerAction) -> bool {
        let mut buckets = self.shared.buckets.borrow_mut();
        if buckets.owner_once.iter().any(|a| a.same_task(&action)) {
            return false;
        }
        buckets.owner_once.push(action);
        true
    }

    /// Schedules an owner action for the first primary flush of a later tick.
    ///
    /// Deduplicated like [`schedule_action_once`](Self::schedule_action_once),
    /// against the deferred bucket.
    pub fn schedule_action_next_tick(&self, action: OwnerAction) -> bool {
        let now = self.now();
        let mut buckets = self.shared.buckets.borrow_mut();
        let Buckets {
            owner_once,
            owner_deferred,
            ..
        } = &mut *buckets;
        owner_deferred.check(now, owner_once);
        if owner_deferred.iter().any(|a| a.same_task(&action)) {
            return false;
        }
        owner_deferred.add(action, now, owner_once);
        true
    }

    /// Shorthand for building an [`OwnerAction`] and passing it to
    /// [`schedule_action_once`](Self::schedule_action_once).
    pub fn schedule_owner_once<O: 'static>(
        &self,
        owner: &Rc<RefCell<O>>,
        action_id: Option<ActionId>,
        action: impl FnOnce(&mut O, &mut TickContext<'_>) + 'static,
    ) -> bool {
        self.schedule_action_once(OwnerAction::new(owner, action_id, action))
    }

    /// Shorthand for building an [`OwnerAction`] and passing it to
    /// [`schedule_action_next_tick`](Self::schedule_action_next_tick).
    pub fn schedule_owner_next_tick<O: 'static>(
        &self,
        owner: &Rc<RefCell<O>>,
        action_id: Option<ActionId>,
        action: impl FnOnce(&mut O, &mut TickContext<'_>) + 'static,
    ) -> bool {
        self.schedule_action_next_tick(OwnerAction::new(owner, action_id, action))
    }

    /// Cancels every pending owner action carrying `id`, immediate or
    /// deferred. Returns the number of entries removed.
    pub fn cancel_action(&self, id: ActionId) -> usize {
        self.remove_owner_actions(|a| a.action_id() == Some(id))
    }

    /// Cancels every pending owner action whose owner is `owner`, whatever
    /// its callback. Returns the number of entries removed.
    pub fn cancel_by_owner(&self, owner: TaskKey) -> usize {
        self.remove_owner_actions(|a| a.owner_key() == owner)
    }

    fn remove_owner_actions(&self, mut matches: impl FnMut(&OwnerAction) -> bool) -> usize {
        let mut buckets = self.shared.buckets.borrow_mut();
        let before = buckets.owner_once.len();
        buckets.owner_once.retain(|a| !matches(a));
        let removed = before - buckets.owner_once.len();
        removed + buckets.owner_deferred.remove_where(matches)
    }

    // -- Pending state --

    /// Whether anything is pending for `key`: a task object with that
    /// identity, or an owner action with that owner.
    #[must_use]
    pub fn is_pending(&self, key: TaskKey) -> bool {
        let buckets = self.shared.buckets.borrow();
        buckets.once.iter().any(|t| t.key == key)
            || buckets.once_deferred.iter().any(|t| t.key == key)
            || buckets.owner_once.iter().any(|a| a.owner_key() == key)
            || buckets.owner_deferred.iter().any(|a| a.owner_key() == key)
    }

    /// Number of one-shot entries waiting, immediate or deferred.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.buckets.borrow().pending_len()
    }

    /// Promotes deferred tasks whose tick has come to the due-now lists.
    /// Returns the number promoted.
    pub fn check(&self) -> usize {
        let now = self.now();
        self.shared.buckets.borrow_mut().promote(now)
    }

    /// Drops every subscriber and pending task. Returns how many entries were
    /// discarded.
    pub fn clear(&self) -> usize {
        let tick = self.now();
        let discarded = self.shared.buckets.borrow_mut().clear();
        self.emit(|sink| sink.on_reset(&ResetEvent { tick, discarded }));
        discarded
    }

    // -- Flushing --

    /// Runs the work due for `phase`; see the [module docs](self) for the
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if a subscriber, task object, or owner is already mutably
    /// borrowed when its turn comes, and propagates any panic raised by a
    /// callback.
    pub fn flush(&self, phase: Phase) -> FlushSummary {
        let tick = self.now();
        self.emit(|sink| sink.on_flush_begin(&FlushBeginEvent { phase, tick }));

        let mut summary = FlushSummary::default();

        if phase == Phase::Primary {
            let due = {
                let mut buckets = self.shared.buckets.borrow_mut();
                summary.promoted = buckets.promote(tick);
                buckets.take_due()
            };
            for task in due {
                if self.run_one_shot(task, tick) {
                    summary.one_shots_run += 1;
                } else {
                    summary.skipped += 1;
                }
            }
        }

        let mut snapshot = {
            let mut buckets = self.shared.buckets.borrow_mut();
            let mut snapshot = mem::take(&mut buckets.scratch);
            buckets.recurring[phase.index()].snapshot_into(&mut snapshot);
            snapshot
        };
        for (key, weak) in snapshot.drain(..) {
            let Some(subscriber) = weak.upgrade() else {
                // The dead weak handle still pins the allocation, so `key`
                // cannot belong to anything newer.
                self.shared.buckets.borrow_mut().recurring[phase.index()].remove(&key);
                summary.skipped += 1;
                self.emit_skipped(phase, tick, TaskKind::Recurring);
                continue;
            };
            let mut cx = TickContext {
                scheduler: self,
                phase,
                tick,
                key,
            };
            subscriber.borrow_mut().run(&mut cx);
            summary.recurring_run += 1;
        }
        {
            let mut buckets = self.shared.buckets.borrow_mut();
            if buckets.scratch.capacity() < snapshot.capacity() {
                buckets.scratch = snapshot;
            }
        }

        self.emit(|sink| {
            sink.on_flush_end(&FlushEndEvent {
                phase,
                tick,
                summary,
            });
        });
        summary
    }

    /// Host hook for the primary phase.
    pub fn on_primary_tick(&self) -> FlushSummary {
        self.flush(Phase::Primary)
    }

    /// Host hook for the late phase, called after all primary work of the
    /// same cycle.
    pub fn on_late_tick(&self) -> FlushSummary {
        self.flush(Phase::Late)
    }

    /// Host hook for the fixed-rate phase.
    pub fn on_fixed_tick(&self) -> FlushSummary {
        self.flush(Phase::Fixed)
    }

    /// Runs one due entry. Returns `false` if its target was gone.
    fn run_one_shot(&self, task: PendingTask, tick: Tick) -> bool {
        match task {
            PendingTask::Plain(plain) => {
                let Some(target) = plain.task.upgrade() else {
                    self.emit_skipped(Phase::Primary, tick, TaskKind::OneShot);
                    return false;
                };
                let mut cx = TickContext {
                    scheduler: self,
                    phase: Phase::Primary,
                    tick,
                    key: plain.key,
                };
                target.borrow_mut().run_once(&mut cx);
                true
            }
            PendingTask::Owned(action) => {
                if !action.is_alive() {
                    self.emit_skipped(Phase::Primary, tick, TaskKind::OwnerAction);
                    return false;
                }
                let mut cx = TickContext {
                    scheduler: self,
                    phase: Phase::Primary,
                    tick,
                    key: action.owner_key(),
                };
                action.run(&mut cx);
                true
            }
        }
    }

    fn emit_skipped(&self, phase: Phase, tick: Tick, kind: TaskKind) {
        self.emit(|sink| sink.on_task_skipped(&TaskSkippedEvent { phase, tick, kind }));
    }

    #[inline]
    fn emit(&self, f: impl FnOnce(&mut dyn TraceSink)) {
        #[cfg(feature = "trace")]
        {
            let mut slot = self.shared.sink.borrow_mut();
            if let Some(sink) = slot.as_deref_mut() {
                f(sink);
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = f;
        }
    }
}
