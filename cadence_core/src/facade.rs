// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily created, resettable scheduler slot.
//!
//! A [`SchedulerSlot`] owns at most one live [`Scheduler`] and knows how to
//! make one. It is meant for an application's composition root: widgets take
//! a [`Scheduler`] handle directly, while the root keeps a slot so a full
//! reinitialization (hot reload, scene teardown) can drop every queue at once.
//!
//! # Lifecycle
//!
//! ```text
//!   Empty ──first use──► Live ──reset()──► Destroyed
//!     ▲                                       │
//!     └──────────── get_or_create() ◄─────────┘
//! ```
//!
//! Once destroyed, every forwarding operation is a silent no-op (returning
//! `false`, `0`, or `None`), so cleanup code running during teardown can keep
//! calling `unregister` or `cancel` without guarding each call. Only an
//! explicit [`get_or_create`](SchedulerSlot::get_or_create) brings the slot
//! back.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::phase::Phase;
use crate::scheduler::{Scheduler, TickContext};
use crate::task::{ActionId, OneShotTask, OwnerAction, RecurringTask, TaskKey};
use crate::trace::FlushSummary;

/// Owner of the process's scheduler core.
pub struct SchedulerSlot {
    current: Option<Scheduler>,
    destroyed: bool,
    factory: Box<dyn Fn() -> Scheduler>,
}

impl fmt::Debug for SchedulerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerSlot")
            .field("current", &self.current)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl SchedulerSlot {
    /// Creates an empty slot that builds its core with `factory` on first
    /// use.
    #[must_use]
    pub fn new(factory: impl Fn() -> Scheduler + 'static) -> Self {
        Self {
            current: None,
            destroyed: false,
            factory: Box::new(factory),
        }
    }

    /// Creates a slot around an existing core.
    #[must_use]
    pub fn with_existing(scheduler: Scheduler, factory: impl Fn() -> Scheduler + 'static) -> Self {
        Self {
            current: Some(scheduler),
            destroyed: false,
            factory: Box::new(factory),
        }
    }

    /// Returns the live core, creating one if needed.
    ///
    /// This is the only call that revives a destroyed slot.
    pub fn get_or_create(&mut self) -> Scheduler {
        self.destroyed = false;
        self.current.get_or_insert_with(|| (self.factory)()).clone()
    }

    /// Returns the live core, creating one unless the slot is destroyed.
    pub fn current(&mut self) -> Option<Scheduler> {
        if self.destroyed {
            return None;
        }
        Some(self.get_or_create())
    }

    /// Returns the live core without creating one.
    #[must_use]
    pub fn get(&self) -> Option<&Scheduler> {
        self.current.as_ref()
    }

    /// Adopts an existing core, returning the one it replaces. Clears the
    /// destroyed flag.
    pub fn install(&mut self, scheduler: Scheduler) -> Option<Scheduler> {
        self.destroyed = false;
        self.current.replace(scheduler)
    }

    /// Whether [`reset`](Self::reset) has run since the last
    /// [`get_or_create`](Self::get_or_create).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Clears every queue of the live core, drops the slot's reference to it,
    /// and marks the slot destroyed. Returns the number of entries discarded.
    ///
    /// Other handles to the old core stay valid but see empty queues.
    pub fn reset(&mut self) -> usize {
        self.destroyed = true;
        self.current.take().map_or(0, |scheduler| scheduler.clear())
    }

    // -- Forwarding operations --

    /// See [`Scheduler::register`].
    pub fn register<T: RecurringTask + 'static>(
        &mut self,
        subscriber: &Rc<RefCell<T>>,
        phase: Phase,
    ) -> bool {
        self.current()
            .is_some_and(|s| s.register(subscriber, phase))
    }

    /// See [`Scheduler::unregister`].
    pub fn unregister(&mut self, key: TaskKey, phase: Phase) -> bool {
        self.current().is_some_and(|s| s.unregister(key, phase))
    }

    /// See [`Scheduler::schedule_once`].
    pub fn schedule_once<T: OneShotTask + 'static>(&mut self, task: &Rc<RefCell<T>>) -> bool {
        self.current().is_some_and(|s| s.schedule_once(task))
    }

    /// See [`Scheduler::schedule_next_tick`].
    pub fn schedule_next_tick<T: OneShotTask + 'static>(&mut self, task: &Rc<RefCell<T>>) -> bool {
        self.current().is_some_and(|s| s.schedule_next_tick(task))
    }

    /// See [`Scheduler::schedule_action_once`].
    pub fn schedule_action_once(&mut self, action: OwnerAction) -> bool {
        self.current()
            .is_some_and(|s| s.schedule_action_once(action))
    }

    /// See [`Scheduler::schedule_action_next_tick`].
    pub fn schedule_action_next_tick(&mut self, action: OwnerAction) -> bool {
        self.current()
            .is_some_and(|s| s.schedule_action_next_tick(action))
    }

    /// See [`Scheduler::schedule_owner_once`].
    pub fn schedule_owner_once<O: 'static>(
        &mut self,
        owner: &Rc<RefCell<O>>,
        action_id: Option<ActionId>,
        action: impl FnOnce(&mut O, &mut TickContext<'_>) + 'static,
    ) -> bool {
        self.schedule_action_once(OwnerAction::new(owner, action_id, action))
    }

    /// See [`Scheduler::schedule_owner_next_tick`].
    pub fn schedule_owner_next_tick<O: 'static>(
        &mut self,
        owner: &Rc<RefCell<O>>,
        action_id: Option<ActionId>,
        action: impl FnOnce(&mut O, &mut TickContext<'_>) + 'static,
    ) -> bool {
        self.schedule_action_next_tick(OwnerAction::new(owner, action_id, action))
    }

    /// See [`Scheduler::cancel`].
    pub fn cancel(&mut self, key: TaskKey) -> usize {
        self.current().map_or(0, |s| s.cancel(key))
    }

    /// See [`Scheduler::cancel_action`].
    pub fn cancel_action(&mut self, id: ActionId) -> usize {
        self.current().map_or(0, |s| s.cancel_action(id))
    }

    /// See [`Scheduler::cancel_by_owner`].
    pub fn cancel_by_owner(&mut self, owner: TaskKey) -> usize {
        self.current().map_or(0, |s| s.cancel_by_owner(owner))
    }

    /// See [`Scheduler::flush`]. Returns `None` once destroyed.
    pub fn flush(&mut self, phase: Phase) -> Option<FlushSummary> {
        self.current().map(|s| s.flush(phase))
    }
}
