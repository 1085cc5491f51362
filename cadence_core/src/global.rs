// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thread-local default scheduler.
//!
//! Hosts that cannot thread a [`Scheduler`] handle through every widget can
//! use this per-thread [`SchedulerSlot`] instead. The host installs its core
//! (or a factory) at startup, drives [`Phase`](crate::phase::Phase) flushes
//! through [`scheduler`], and calls [`reset`] on teardown. After a reset,
//! [`scheduler`] returns `None` until [`get_or_create`] or [`install`] is
//! called again, so widget cleanup that runs late does not resurrect a core.
//!
//! The slot is only borrowed for the duration of each call here. Callers get a
//! cloned handle back, so flushing never happens with the slot borrowed.
//!
//! Requires the `std` feature.

use std::cell::RefCell;

use crate::facade::SchedulerSlot;
use crate::scheduler::Scheduler;
use crate::tick::FrameClock;

std::thread_local! {
    static SLOT: RefCell<SchedulerSlot> =
        RefCell::new(SchedulerSlot::new(|| Scheduler::new(FrameClock::new())));
}

/// Replaces the factory used to create this thread's scheduler.
///
/// Does not affect a core that already exists.
pub fn set_factory(factory: impl Fn() -> Scheduler + 'static) {
    SLOT.with_borrow_mut(|slot| {
        let existing = slot.get().cloned();
        let destroyed = slot.is_destroyed();
        let mut replacement = match existing {
            Some(scheduler) => SchedulerSlot::with_existing(scheduler, factory),
            None => SchedulerSlot::new(factory),
        };
        if destroyed {
            replacement.reset();
        }
        *slot = replacement;
    });
}

/// Makes `scheduler` this thread's scheduler, returning the previous one.
pub fn install(scheduler: Scheduler) -> Option<Scheduler> {
    SLOT.with_borrow_mut(|slot| slot.install(scheduler))
}

/// Returns this thread's scheduler, creating it on first use. Returns `None`
/// after [`reset`].
#[must_use]
pub fn scheduler() -> Option<Scheduler> {
    SLOT.with_borrow_mut(SchedulerSlot::current)
}

/// Returns this thread's scheduler, creating it even after [`reset`].
#[must_use]
pub fn get_or_create() -> Scheduler {
    SLOT.with_borrow_mut(SchedulerSlot::get_or_create)
}

/// Clears and drops this thread's scheduler. Returns the number of entries
/// discarded.
pub fn reset() -> usize {
    SLOT.with_borrow_mut(SchedulerSlot::reset)
}

/// Whether [`reset`] has run since the scheduler was last created.
#[must_use]
pub fn is_destroyed() -> bool {
    SLOT.with_borrow(SchedulerSlot::is_destroyed)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::phase::Phase;
    use crate::scheduler::TickContext;
    use crate::task::RecurringTask;

    struct Idle;

    impl RecurringTask for Idle {
        fn run(&mut self, _cx: &mut TickContext<'_>) {}
    }

    // Each test runs on its own thread, so the thread-local slot starts fresh.

    #[test]
    fn lazily_created_and_shared() {
        let a = scheduler().expect("fresh slot creates a core");
        let b = scheduler().expect("core is reused");
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn reset_blocks_until_recreated() {
        let sub = Rc::new(RefCell::new(Idle));
        let sched = get_or_create();
        sched.register(&sub, Phase::Primary);
        assert_eq!(reset(), 1);
        assert!(is_destroyed());
        assert!(scheduler().is_none());

        let revived = get_or_create();
        assert!(!revived.ptr_eq(&sched));
        assert!(!is_destroyed());
    }

    #[test]
    fn flushing_through_the_slot_allows_reentry() {
        struct UsesGlobal;
        impl RecurringTask for UsesGlobal {
            fn run(&mut self, _cx: &mut TickContext<'_>) {
                // The slot must not be borrowed while flushing.
                assert!(scheduler().is_some());
            }
        }
        let sub = Rc::new(RefCell::new(UsesGlobal));
        let sched = get_or_create();
        sched.register(&sub, Phase::Late);
        let summary = scheduler().map(|s| s.flush(Phase::Late));
        assert_eq!(summary.map(|s| s.recurring_run), Some(1));
    }

    #[test]
    fn installed_core_and_factory() {
        let clock = FrameClock::starting_at(crate::tick::Tick(10));
        let own = Scheduler::new(clock.clone());
        assert!(install(own.clone()).is_none());
        assert!(scheduler().is_some_and(|s| s.ptr_eq(&own)));

        set_factory(move || Scheduler::new(clock.clone()));
        assert!(scheduler().is_some_and(|s| s.ptr_eq(&own)), "existing core survives a factory swap");
        reset();
        assert!(scheduler().is_none(), "reset blocks lazy creation");
        assert_eq!(get_or_create().now().get(), 10);
    }
}
