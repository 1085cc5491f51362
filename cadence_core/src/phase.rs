// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host update phases.
//!
//! A host driver exposes three independent invocation points per cycle. The
//! scheduler keeps one recurring subscriber set per phase; one-shot work only
//! runs on [`Phase::Primary`].

/// Number of distinct phases.
pub(crate) const PHASE_COUNT: usize = 3;

/// One of the per-cycle invocation points a host driver exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Variable-rate, once-per-frame phase. One-shot tasks are flushed here.
    Primary,
    /// Runs after all primary work for the same cycle has completed.
    Late,
    /// Fixed-rate phase, decoupled from the frame rate.
    Fixed,
}

impl Phase {
    /// All phases, in the order a typical host invokes them within a cycle.
    pub const ALL: [Self; PHASE_COUNT] = [Self::Primary, Self::Late, Self::Fixed];

    /// Maps the phase to a dense array index.
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Late => 1,
            Self::Fixed => 2,
        }
    }

    /// Short lowercase name, suitable for log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Late => "late",
            Self::Fixed => "fixed",
        }
    }
}
