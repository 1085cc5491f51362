// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Task kinds and identity.
//!
//! The scheduler never owns the objects it calls. Subscribers and one-shot
//! task objects are held through [`Weak`] handles, and an owner/action pair
//! holds a weak handle to its owner: when the last strong reference goes away
//! the entry is skipped silently the next time it would have run.
//!
//! Identity is allocation identity. [`TaskKey::of`] turns an `Rc` into a key
//! that stays valid for as long as the scheduler holds a weak handle to the
//! same allocation, so callers unregister or cancel with the same `Rc` they
//! registered.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::any::Any;
use core::cell::RefCell;
use core::fmt;

use crate::scheduler::TickContext;

/// Identity of a subscriber, task object, or owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey(usize);

impl TaskKey {
    /// Returns the key identifying the allocation behind `rc`.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>().addr())
    }

    #[inline]
    pub(crate) fn of_weak<T: ?Sized>(weak: &Weak<T>) -> Self {
        Self(weak.as_ptr().cast::<()>().addr())
    }
}

impl fmt::Debug for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskKey({:#x})", self.0)
    }
}

/// Caller-chosen identity for the callback half of an [`OwnerAction`].
///
/// Closures have no identity of their own; give one to an action when it must
/// be cancelled or deduplicated independently of other actions scheduled for
/// the same owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(pub u64);

/// Work run on every flush of the phase it is registered for.
pub trait RecurringTask {
    /// Runs one update.
    fn run(&mut self, cx: &mut TickContext<'_>);
}

/// Work run at most once per scheduling.
pub trait OneShotTask {
    /// Runs the task.
    fn run_once(&mut self, cx: &mut TickContext<'_>);
}

/// Which kind of entry a trace event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A recurring subscriber.
    Recurring,
    /// A one-shot task object.
    OneShot,
    /// An owner/action pair.
    OwnerAction,
}

/// An owner handle bound to a one-shot callback.
///
/// Two actions are the same task if both carry an [`ActionId`] and the ids are
/// equal; otherwise they are the same task if they share an owner. That is
/// what lets [`cancel_by_owner`](crate::scheduler::Scheduler::cancel_by_owner)
/// drop everything pending for an owner without naming the callbacks.
pub struct OwnerAction {
    owner: Weak<dyn Any>,
    action_id: Option<ActionId>,
    action: Box<dyn FnOnce(&mut TickContext<'_>)>,
}

impl OwnerAction {
    /// Binds `action` to `owner`.
    ///
    /// The action receives the owner mutably borrowed. It is not run at all if
    /// the owner has been dropped by then.
    pub fn new<O: 'static>(
        owner: &Rc<RefCell<O>>,
        action_id: Option<ActionId>,
        action: impl FnOnce(&mut O, &mut TickContext<'_>) + 'static,
    ) -> Self {
        let weak = Rc::downgrade(owner);
        let erased: Weak<dyn Any> = weak.clone();
        Self {
            owner: erased,
            action_id,
            action: Box::new(move |cx: &mut TickContext<'_>| {
                if let Some(owner) = weak.upgrade() {
                    action(&mut owner.borrow_mut(), cx);
                }
            }),
        }
    }

    /// Identity of the owner.
    #[must_use]
    pub fn owner_key(&self) -> TaskKey {
        TaskKey::of_weak(&self.owner)
    }

    /// Identity of the callback, if one was given.
    #[must_use]
    pub fn action_id(&self) -> Option<ActionId> {
        self.action_id
    }

    /// Whether the owner still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }

    /// Applies the equality rule described on the type.
    #[must_use]
    pub fn same_task(&self, other: &Self) -> bool {
        match (self.action_id, other.action_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.owner_key() == other.owner_key(),
        }
    }

    pub(crate) fn run(self, cx: &mut TickContext<'_>) {
        (self.action)(cx);
    }
}

impl fmt::Debug for OwnerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerAction")
            .field("owner", &self.owner_key())
            .field("action_id", &self.action_id)
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

/// A one-shot task object held weakly.
#[derive(Clone)]
pub(crate) struct PlainTask {
    pub(crate) key: TaskKey,
    pub(crate) task: Weak<RefCell<dyn OneShotTask>>,
}

impl PlainTask {
    pub(crate) fn new<T: OneShotTask + 'static>(task: &Rc<RefCell<T>>) -> Self {
        let task = Rc::downgrade(task);
        let task: Weak<RefCell<dyn OneShotTask>> = task;
        Self {
            key: TaskKey::of_weak(&task),
            task,
        }
    }
}

impl fmt::Debug for PlainTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainTask")
            .field("key", &self.key)
            .field("alive", &(self.task.strong_count() > 0))
            .finish()
    }
}

/// A due one-shot entry of either kind, in execution order.
#[derive(Debug)]
pub(crate) enum PendingTask {
    Plain(PlainTask),
    Owned(OwnerAction),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner;

    #[test]
    fn key_matches_between_strong_and_weak_handles() {
        let rc = Rc::new(RefCell::new(Owner));
        let weak = Rc::downgrade(&rc);
        assert_eq!(TaskKey::of(&rc), TaskKey::of_weak(&weak));
        let other = Rc::new(RefCell::new(Owner));
        assert_ne!(TaskKey::of(&rc), TaskKey::of(&other));
    }

    #[test]
    fn key_survives_unsizing() {
        struct Noop;
        impl OneShotTask for Noop {
            fn run_once(&mut self, _cx: &mut TickContext<'_>) {}
        }
        let rc = Rc::new(RefCell::new(Noop));
        assert_eq!(PlainTask::new(&rc).key, TaskKey::of(&rc));
    }

    #[test]
    fn owner_liveness_tracks_strong_count() {
        let owner = Rc::new(RefCell::new(Owner));
        let action = OwnerAction::new(&owner, None, |_, _| {});
        assert!(action.is_alive());
        drop(owner);
        assert!(!action.is_alive());
    }

    #[test]
    fn equality_uses_action_id_when_both_present() {
        let a = Rc::new(RefCell::new(Owner));
        let b = Rc::new(RefCell::new(Owner));

        let a1 = OwnerAction::new(&a, Some(ActionId(1)), |_, _| {});
        let a2 = OwnerAction::new(&a, Some(ActionId(2)), |_, _| {});
        let b1 = OwnerAction::new(&b, Some(ActionId(1)), |_, _| {});
        let a_any = OwnerAction::new(&a, None, |_, _| {});

        assert!(!a1.same_task(&a2), "same owner, different callbacks");
        assert!(a1.same_task(&b1), "callback identity decides");
        assert!(a_any.same_task(&a1), "no callback identity: owner decides");
        assert!(!a_any.same_task(&b1));
    }
}
