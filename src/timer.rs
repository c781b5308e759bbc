//! Cancellable countdown tied to the displayed question
//!
//! The countdown never sleeps on its own: the session controller schedules
//! a tick callback through the embedding runtime and feeds it back in one
//! second later. Every arm and cancel bumps a generation counter, so a
//! tick scheduled for a superseded question carries a stale generation and
//! is rejected instead of mutating later state.

use serde::{Deserialize, Serialize};

/// Live countdown state for the currently displayed question
///
/// `remaining` is `Some` exactly while a timed question is on display.
/// All changes to it go through [`Countdown::start`] and
/// [`Countdown::cancel`], which are the single chokepoint that invalidates
/// any outstanding scheduled tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Countdown {
    /// Seconds left on the clock, or `None` when no timed question is shown
    remaining: Option<u32>,
    /// Bumped on every arm/cancel; ticks carrying an older value are stale
    generation: u64,
}

impl Countdown {
    /// Arms the countdown at `limit` seconds
    ///
    /// Any previously scheduled tick is implicitly cancelled by the
    /// generation bump. The returned generation must be attached to the
    /// tick callback scheduled by the caller.
    pub fn start(&mut self, limit: u32) -> u64 {
        self.generation += 1;
        self.remaining = Some(limit);
        self.generation
    }

    /// Stops the countdown and clears the remaining time
    ///
    /// Safe to call when nothing is armed; the generation still advances
    /// so that an in-flight tick cannot land afterwards.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.remaining = None;
    }

    /// Applies one scheduled tick
    ///
    /// Decrements the clock by exactly one second and returns the new
    /// remaining time. Returns `None` without touching anything if the
    /// tick is stale (older generation) or the clock is not running.
    pub fn tick(&mut self, generation: u64) -> Option<u32> {
        match self.remaining {
            Some(remaining) if remaining > 0 && generation == self.generation => {
                let remaining = remaining - 1;
                self.remaining = Some(remaining);
                Some(remaining)
            }
            _ => None,
        }
    }

    /// Returns the seconds left, or `None` when no timed question is shown
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}
