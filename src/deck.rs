//! Shuffled presentation order over a question pool
//!
//! The deck is a leaf component driven by the session controller. It
//! produces a uniform random permutation of whatever pool it is given and
//! supports the two access patterns of the game: reveal-one (reshuffle the
//! whole pool and draw the top card) and browse (shuffle once, let the
//! player traverse the order by swiping). A manual reshuffle is gated by a
//! busy flag and settles after a display delay, at which point the new
//! order is swapped in atomically.

use serde::{Deserialize, Serialize};

use crate::question::Question;

/// Messages sent to the presentation layer about deck changes
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// A manual reshuffle started; slide-driven selection is suppressed
    /// until it settles
    ShuffleStarted,
    /// A reshuffle settled; the full new order, cursor back at 0
    Shuffled {
        /// The new presentation order
        deck: Vec<Question>,
    },
}

/// Alarm messages for the deck's delayed reshuffle settling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The reshuffle display delay elapsed; swap in the pending order
    ShuffleSettled {
        /// Generation captured when the reshuffle began
        generation: u64,
    },
}

/// Produces a uniform random permutation of the pool
///
/// Fisher–Yates in the Durstenfeld variant: walk `i` from the top down to
/// 1, draw `j` uniformly from `[0, i]`, swap. Linear time, every one of
/// the `n!` permutations equally likely. An empty pool yields an empty
/// order.
pub fn shuffle(pool: &[Question]) -> Vec<Question> {
    let mut shuffled = pool.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = fastrand::usize(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// A shuffled presentation order with a browse cursor
///
/// Owned by the session controller. The generation counter invalidates
/// reshuffle-settled alarms that outlive the state they were scheduled
/// for; it is never reset so stale alarms stay stale across a session
/// reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    /// Current presentation order
    order: Vec<Question>,
    /// Order computed by an in-flight reshuffle, swapped in when it settles
    pending: Option<Vec<Question>>,
    /// True while a reshuffle is displaying; gates browse selection
    shuffling: bool,
    /// Browse cursor into `order`
    position: usize,
    /// Bumped whenever the order is replaced or a reshuffle begins
    generation: u64,
}

impl Deck {
    /// Rebuilds the browse order from a fresh pool
    ///
    /// Shuffles once and resets the cursor; used when the active pool
    /// changes (entering manual play at a chosen level). Abandons any
    /// in-flight reshuffle.
    pub fn rebuild(&mut self, pool: &[Question]) {
        self.generation += 1;
        self.order = shuffle(pool);
        self.pending = None;
        self.shuffling = false;
        self.position = 0;
    }

    /// Empties the deck
    ///
    /// Used on session reset and when entering a reveal-discipline screen,
    /// where no standing order is needed. Abandons any in-flight
    /// reshuffle.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.order = Vec::new();
        self.pending = None;
        self.shuffling = false;
        self.position = 0;
    }

    /// Reveal discipline: reshuffles the full pool and draws the top card
    ///
    /// Every draw re-shuffles independently, so repeats across
    /// consecutive draws are possible. Returns `None` on an empty pool.
    pub fn draw(&mut self, pool: &[Question]) -> Option<Question> {
        self.generation += 1;
        self.order = shuffle(pool);
        self.pending = None;
        self.shuffling = false;
        self.position = 0;
        self.order.first().cloned()
    }

    /// Browse discipline: selects the question at a slide position
    ///
    /// Returns `None` while a reshuffle is in flight (slide-change events
    /// fired by the transition animation must not select) or when the
    /// position is out of range.
    pub fn browse_select(&mut self, index: usize) -> Option<&Question> {
        if self.shuffling {
            return None;
        }
        let question = self.order.get(index)?;
        self.position = index;
        Some(question)
    }

    /// Starts a manual reshuffle of the current order
    ///
    /// The new order is computed now but held pending until the display
    /// delay elapses. Returns the generation to attach to the settling
    /// alarm, or `None` when a reshuffle is already in flight.
    pub fn begin_reshuffle(&mut self) -> Option<u64> {
        if self.shuffling {
            return None;
        }
        self.generation += 1;
        self.pending = Some(shuffle(&self.order));
        self.shuffling = true;
        Some(self.generation)
    }

    /// Settles a reshuffle: swaps the pending order in atomically
    ///
    /// Rejects stale generations (a reset or rebuild happened since the
    /// reshuffle began). Returns whether the swap happened.
    pub fn finish_reshuffle(&mut self, generation: u64) -> bool {
        if !self.shuffling || generation != self.generation {
            return false;
        }
        self.order = self.pending.take().unwrap_or_default();
        self.shuffling = false;
        self.position = 0;
        true
    }

    /// Returns the current presentation order
    pub fn order(&self) -> &[Question] {
        &self.order
    }

    /// Returns the browse cursor
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns whether a reshuffle is in flight
    pub fn is_shuffling(&self) -> bool {
        self.shuffling
    }
}
