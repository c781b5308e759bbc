//! Configuration constants for the talkup game system
//!
//! This module contains the configuration limits and timing constants
//! used throughout the game system to ensure data integrity and
//! provide consistent boundaries for different game components.

/// Session configuration constants
pub mod session {
    /// Countdown lengths offered by the presentation layer, in seconds
    pub const TIME_LIMIT_CHOICES: [u32; 3] = [5, 10, 15];
    /// Countdown length configured when a session is created, in seconds
    pub const DEFAULT_TIME_LIMIT: u32 = 10;
}

/// Level-up progression constants
pub mod levelup {
    /// Turns that must be taken at level 1 before advancing to level 2
    pub const LEVEL_ONE_TURNS: u32 = 4;
    /// Turns that must be taken at level 2 before advancing to level 3
    pub const LEVEL_TWO_TURNS: u32 = 6;
}

/// Question data constants
pub mod question {
    /// Minimum length of question text in characters
    pub const MIN_TEXT_LENGTH: usize = 1;
    /// Maximum length of question text in characters
    pub const MAX_TEXT_LENGTH: usize = 200;
}

/// Question deck constants
pub mod deck {
    use web_time::Duration;

    /// Display delay before a manual reshuffle settles and the new order is
    /// swapped in
    pub const SHUFFLE_DELAY: Duration = Duration::from_millis(1000);
}

/// Countdown timer constants
pub mod timer {
    use web_time::Duration;

    /// Interval between countdown decrements
    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
}
