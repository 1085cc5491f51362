// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host tick counter.
//!
//! [`Tick`] identifies one host cycle. The host advances it monotonically and
//! the scheduler reads it through a [`TickSource`] whenever it needs to decide
//! whether deferred work has become due.
//!
//! [`FrameClock`] is a shareable counter for hosts that do not already have
//! one (and for tests): clone it, hand one clone to the scheduler, and call
//! [`advance`](FrameClock::advance) once per cycle on the other.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

/// A host cycle number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(pub u64);

impl Tick {
    /// The first tick.
    pub const ZERO: Self = Self(0);

    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the following tick, saturating at `u64::MAX`.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read access to the host's monotonically increasing tick counter.
pub trait TickSource {
    /// Returns the current tick. Must never decrease between calls.
    fn now(&self) -> Tick;
}

/// A manually advanced, shareable tick counter.
///
/// Clones share the same counter.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    counter: Rc<Cell<u64>>,
}

impl FrameClock {
    /// Creates a clock at [`Tick::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock starting at the given tick.
    #[must_use]
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            counter: Rc::new(Cell::new(tick.0)),
        }
    }

    /// Returns the current tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        Tick(self.counter.get())
    }

    /// Advances to the next tick and returns it.
    pub fn advance(&self) -> Tick {
        let next = self.now().next();
        self.counter.set(next.0);
        next
    }

    /// Jumps forward to `tick`.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is earlier than the current tick.
    pub fn set(&self, tick: Tick) {
        assert!(
            tick >= self.now(),
            "tick counter must be monotonic ({tick:?} < {:?})",
            self.now()
        );
        self.counter.set(tick.0);
    }
}

impl TickSource for FrameClock {
    fn now(&self) -> Tick {
        Self::now(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_counter() {
        let host = FrameClock::new();
        let view = host.clone();
        assert_eq!(view.now(), Tick::ZERO);
        host.advance();
        host.advance();
        assert_eq!(view.now(), Tick(2));
        assert_eq!(TickSource::now(&view), Tick(2));
    }

    #[test]
    fn starting_at_and_set() {
        let clock = FrameClock::starting_at(Tick(10));
        assert_eq!(clock.advance(), Tick(11));
        clock.set(Tick(20));
        assert_eq!(clock.now(), Tick(20));
    }

    #[test]
    #[should_panic(expected = "tick counter must be monotonic")]
    fn set_backwards_panics() {
        let clock = FrameClock::starting_at(Tick(5));
        clock.set(Tick(4));
    }

    #[test]
    fn next_saturates() {
        assert_eq!(Tick(u64::MAX).next(), Tick(u64::MAX));
    }
}
