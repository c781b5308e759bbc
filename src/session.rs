//! Session controller and state management
//!
//! This module contains the main session struct and logic for a single
//! play-through: which screen is active, which game mode is selected, how
//! level-up progression advances, which question is on display, and the
//! lifecycle of the per-question countdown. The controller is the sole
//! mutator of session state; the presentation layer feeds it
//! [`IncomingMessage`] values and renders what comes back through the
//! [`Presenter`](crate::presenter::Presenter) channel.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::Duration;

use crate::{
    constants, deck,
    deck::Deck,
    other_games::{self, OtherGame},
    presenter::Presenter,
    question::{Category, Level, Question, QuestionBank},
    timer::Countdown,
};

/// The overall game variant selected at the top screen
///
/// A session starts with no mode; one is chosen on the mode-select screen
/// and holds until the session resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pick a level, then draw random questions one at a time
    Random,
    /// Pick a level, then swipe through a shuffled deck by hand
    Manual,
    /// Start at level 1 and climb as turns are taken
    LevelUp,
    /// Pick a topic category, then draw random questions from it
    Category,
}

/// The active screen; exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    /// Top screen offering the game modes
    ModeSelect,
    /// Level picker for random and manual modes
    LevelSelect,
    /// Category picker for category mode
    CategorySelect,
    /// Informational browser of other conversation games
    OtherGames,
    /// A round in progress
    Playing,
}

/// Inputs from the presentation layer
///
/// Every button press, swipe notification, and setting change arrives as
/// one of these. Inputs that make no sense on the current screen are
/// ignored; all operations are total.
#[derive(Debug, Deserialize, Clone)]
pub enum IncomingMessage {
    /// A game mode was chosen on the mode-select screen
    SelectMode(Mode),
    /// The other-games browser was opened from the mode-select screen
    OpenOtherGames,
    /// A level was chosen on the level-select screen
    SelectLevel(Level),
    /// A category was chosen on the category-select screen
    SelectCategory(Category),
    /// The back button on a picker or browser screen
    Back,
    /// The countdown length was changed, or cleared with `None`
    SetTimeLimit(Option<u32>),
    /// The reveal button was pressed (random, level-up, category modes)
    ShowQuestion,
    /// The swiper moved to a new slide position (manual mode)
    SlideChange(usize),
    /// The reshuffle button was pressed (manual mode)
    Shuffle,
    /// The next-question button was pressed
    Next,
    /// The end-game button was pressed
    EndGame,
}

/// Update messages sent to the presentation layer about session changes
///
/// These announce deltas as they happen; a renderer that missed some can
/// resynchronize from [`Session::state_message`].
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// The session returned to the mode-select screen
    ModeSelect,
    /// The level-select screen opened
    LevelSelect {
        /// The mode being configured
        mode: Mode,
    },
    /// The category-select screen opened
    CategorySelect {
        /// The categories on offer
        categories: Vec<Category>,
    },
    /// The other-games browser opened
    OtherGames {
        /// The reference entries to display
        games: Vec<OtherGame>,
    },
    /// A round started
    Playing {
        /// The mode being played
        mode: Mode,
        /// The active level
        level: Level,
        /// The active category (category mode only)
        category: Option<Category>,
        /// The deck order for browsing (manual mode; empty otherwise)
        deck: Vec<Question>,
        /// The configured countdown length in seconds
        time_limit: Option<u32>,
    },
    /// A question was revealed or picked
    QuestionRevealed {
        /// The question now on display
        question: Question,
        /// The countdown start value, when a time limit is configured
        remaining_time: Option<u32>,
    },
    /// The displayed question was cleared by the next-question action
    QuestionCleared {
        /// The active level after any level-up
        level: Level,
        /// The turn count after this turn
        turn_count: u32,
    },
    /// One second elapsed on the countdown
    TimerTick {
        /// Seconds left on the clock
        remaining_time: u32,
    },
    /// The countdown length setting changed
    TimeLimitChanged {
        /// The new setting
        time_limit: Option<u32>,
    },
}

/// Full per-screen snapshots for a (re)attaching renderer
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The mode-select screen is active
    ModeSelect,
    /// The level-select screen is active
    LevelSelect {
        /// The mode being configured
        mode: Mode,
    },
    /// The category-select screen is active
    CategorySelect {
        /// The categories on offer
        categories: Vec<Category>,
    },
    /// The other-games browser is active
    OtherGames {
        /// The reference entries to display
        games: Vec<OtherGame>,
    },
    /// A round is in progress
    Playing {
        /// The mode being played
        mode: Mode,
        /// The active level
        level: Level,
        /// The active category (category mode only)
        category: Option<Category>,
        /// The deck order for browsing (manual mode; empty otherwise)
        deck: Vec<Question>,
        /// The browse cursor into the deck
        position: usize,
        /// Whether a reshuffle is displaying
        is_shuffling: bool,
        /// The question on display, if one was revealed
        question: Option<Question>,
        /// The configured countdown length in seconds
        time_limit: Option<u32>,
        /// Seconds left on the clock, while a timed question is shown
        remaining_time: Option<u32>,
    },
}

/// Alarm messages for the session's scheduled callbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One countdown interval elapsed
    CountdownTick {
        /// Generation captured when the countdown was armed
        generation: u64,
    },
}

/// Turns required at a level before advancing, `None` where the level
/// never advances
fn required_turns(level: Level) -> Option<u32> {
    match level {
        Level::One => Some(constants::levelup::LEVEL_ONE_TURNS),
        Level::Two => Some(constants::levelup::LEVEL_TWO_TURNS),
        Level::Three => None,
    }
}

/// A single play-through of the game
///
/// Owns all mutable state: the screen FSM, mode, progression, the
/// displayed question, the deck, and the countdown. All mutation goes
/// through [`Session::receive_message`] and [`Session::receive_alarm`]
/// (or the public operations they dispatch to), so the presentation
/// layer always observes the result of the most recent completed
/// operation.
#[derive(Serialize, Deserialize)]
pub struct Session {
    /// The static question datasets
    bank: QuestionBank,
    /// The active screen
    screen: Screen,
    /// The selected game mode, `None` until one is chosen
    mode: Option<Mode>,
    /// The active level (random, manual, and level-up modes)
    selected_level: Level,
    /// The active category (category mode, while playing)
    selected_category: Option<Category>,
    /// The question on display, `None` while awaiting a draw
    current_question: Option<Question>,
    /// Turns taken at the current level (level-up mode only)
    turn_count: u32,
    /// Configured countdown length in seconds, `None` for untimed play
    time_limit: Option<u32>,
    /// Shuffled presentation order for manual browsing
    deck: Deck,
    /// Countdown for the displayed question
    countdown: Countdown,
}

impl Debug for Session {
    /// Custom debug implementation that avoids printing the datasets
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("screen", &self.screen)
            .field("mode", &self.mode)
            .field("selected_level", &self.selected_level)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session over the given question bank
    ///
    /// The session starts on the mode-select screen with no mode chosen,
    /// level 1 selected, and the default countdown length configured.
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank,
            screen: Screen::ModeSelect,
            mode: None,
            selected_level: Level::One,
            selected_category: None,
            current_question: None,
            turn_count: 0,
            time_limit: Some(constants::session::DEFAULT_TIME_LIMIT),
            deck: Deck::default(),
            countdown: Countdown::default(),
        }
    }

    /// Handles an input from the presentation layer
    ///
    /// Routes the input to the matching operation if it is legal on the
    /// current screen, and ignores it otherwise. Setting the time limit
    /// and ending the game are accepted from anywhere.
    ///
    /// # Arguments
    ///
    /// * `message` - The input to process
    /// * `schedule_message` - Function to schedule delayed alarm callbacks
    /// * `presenter` - Channel to the presentation layer
    ///
    /// # Type Parameters
    ///
    /// * `P` - Type implementing the Presenter trait
    /// * `S` - Function type for scheduling alarm messages
    pub fn receive_message<P: Presenter, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: IncomingMessage,
        schedule_message: S,
        presenter: &P,
    ) {
        match message {
            IncomingMessage::SetTimeLimit(limit) => self.set_time_limit(limit, presenter),
            IncomingMessage::EndGame => self.reset(presenter),
            message => match self.screen {
                Screen::ModeSelect => match message {
                    IncomingMessage::SelectMode(mode) => self.select_mode(mode, presenter),
                    IncomingMessage::OpenOtherGames => self.open_other_games(presenter),
                    _ => {}
                },
                Screen::LevelSelect => match message {
                    IncomingMessage::SelectLevel(level) => self.select_level(level, presenter),
                    IncomingMessage::Back => self.back_to_mode_select(presenter),
                    _ => {}
                },
                Screen::CategorySelect => match message {
                    IncomingMessage::SelectCategory(category) => {
                        self.select_category(category, presenter);
                    }
                    IncomingMessage::Back => self.back_to_mode_select(presenter),
                    _ => {}
                },
                Screen::OtherGames => match message {
                    IncomingMessage::Back => self.back_to_mode_select(presenter),
                    _ => {}
                },
                Screen::Playing => match (self.mode, message) {
                    (
                        Some(Mode::Random | Mode::LevelUp | Mode::Category),
                        IncomingMessage::ShowQuestion,
                    ) => self.show_question(schedule_message, presenter),
                    (
                        Some(Mode::Random | Mode::LevelUp | Mode::Category),
                        IncomingMessage::Next,
                    ) => self.advance_question(presenter),
                    (Some(Mode::Manual), IncomingMessage::SlideChange(index)) => {
                        self.slide_change(index, schedule_message, presenter);
                    }
                    (Some(Mode::Manual), IncomingMessage::Shuffle) => {
                        self.shuffle_deck(schedule_message, presenter);
                    }
                    _ => {}
                },
            },
        }
    }

    /// Handles a scheduled alarm callback
    ///
    /// Countdown ticks decrement the clock and reschedule themselves
    /// while time remains; reshuffle settlings swap the pending deck
    /// order in. Alarms carrying a stale generation (their state was
    /// superseded after they were scheduled) are inert.
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm to process
    /// * `schedule_message` - Function to schedule delayed alarm callbacks
    /// * `presenter` - Channel to the presentation layer
    ///
    /// # Type Parameters
    ///
    /// * `P` - Type implementing the Presenter trait
    /// * `S` - Function type for scheduling alarm messages
    pub fn receive_alarm<P: Presenter, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: crate::AlarmMessage,
        mut schedule_message: S,
        presenter: &P,
    ) {
        match message {
            crate::AlarmMessage::Session(AlarmMessage::CountdownTick { generation }) => {
                if let Some(remaining_time) = self.countdown.tick(generation) {
                    presenter.send_message(&UpdateMessage::TimerTick { remaining_time }.into());
                    if remaining_time > 0 {
                        schedule_message(
                            AlarmMessage::CountdownTick { generation }.into(),
                            constants::timer::TICK_INTERVAL,
                        );
                    }
                }
            }
            crate::AlarmMessage::Deck(deck::AlarmMessage::ShuffleSettled { generation }) => {
                if self.deck.finish_reshuffle(generation) {
                    presenter.send_message(
                        &deck::UpdateMessage::Shuffled {
                            deck: self.deck.order().to_vec(),
                        }
                        .into(),
                    );
                }
            }
        }
    }

    /// Displays a question and starts its countdown
    ///
    /// Both draw disciplines funnel through here: reveal draws pass the
    /// drawn card, manual browsing passes the card at the new slide
    /// position. The caller guarantees the question belongs to the active
    /// pool. If a time limit is configured the countdown is armed at that
    /// limit, superseding any countdown for a previous question.
    ///
    /// # Arguments
    ///
    /// * `question` - The question to display
    /// * `schedule_message` - Function to schedule delayed alarm callbacks
    /// * `presenter` - Channel to the presentation layer
    pub fn select_question<P: Presenter, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        question: Question,
        mut schedule_message: S,
        presenter: &P,
    ) {
        self.current_question = Some(question.clone());

        let remaining_time = match self.time_limit {
            Some(limit) => {
                let generation = self.countdown.start(limit);
                if limit > 0 {
                    schedule_message(
                        AlarmMessage::CountdownTick { generation }.into(),
                        constants::timer::TICK_INTERVAL,
                    );
                }
                Some(limit)
            }
            None => {
                // the previous question may still have a live countdown
                self.countdown.cancel();
                None
            }
        };

        presenter.send_message(
            &UpdateMessage::QuestionRevealed {
                question,
                remaining_time,
            }
            .into(),
        );
    }

    /// Clears the displayed question and counts the turn
    ///
    /// In level-up mode every next-question press counts as one taken
    /// turn, whether or not a question was actually shown first; reaching
    /// the required turns for the current level advances it and zeroes
    /// the count. Progression is monotonic and stops at the top level.
    /// The countdown for the cleared question is cancelled.
    ///
    /// # Arguments
    ///
    /// * `presenter` - Channel to the presentation layer
    pub fn advance_question<P: Presenter>(&mut self, presenter: &P) {
        if matches!(self.mode, Some(Mode::LevelUp)) {
            self.turn_count += 1;

            if let Some(required) = required_turns(self.selected_level) {
                if self.turn_count >= required {
                    if let Some(next) = self.selected_level.next() {
                        self.selected_level = next;
                        self.turn_count = 0;
                    }
                }
            }
        }

        self.current_question = None;
        self.countdown.cancel();

        presenter.send_message(
            &UpdateMessage::QuestionCleared {
                level: self.selected_level,
                turn_count: self.turn_count,
            }
            .into(),
        );
    }

    /// Returns the session to its initial defaults, from any state
    ///
    /// Everything goes back to the values of a fresh session, including
    /// the countdown length. Generation counters inside the countdown and
    /// deck keep advancing instead of resetting, so alarms scheduled
    /// before the reset can never act on the fresh state.
    ///
    /// # Arguments
    ///
    /// * `presenter` - Channel to the presentation layer
    pub fn reset<P: Presenter>(&mut self, presenter: &P) {
        self.screen = Screen::ModeSelect;
        self.mode = None;
        self.selected_level = Level::One;
        self.selected_category = None;
        self.current_question = None;
        self.turn_count = 0;
        self.time_limit = Some(constants::session::DEFAULT_TIME_LIMIT);
        self.countdown.cancel();
        self.deck.clear();

        presenter.send_message(&UpdateMessage::ModeSelect.into());
    }

    /// Stores the countdown length for future reveals
    ///
    /// Accepts any length or `None` for untimed play; the presentation
    /// layer offers the choices in
    /// [`TIME_LIMIT_CHOICES`](constants::session::TIME_LIMIT_CHOICES).
    /// A countdown already in progress is unaffected.
    ///
    /// # Arguments
    ///
    /// * `limit` - The new countdown length in seconds, or `None`
    /// * `presenter` - Channel to the presentation layer
    pub fn set_time_limit<P: Presenter>(&mut self, limit: Option<u32>, presenter: &P) {
        self.time_limit = limit;
        presenter.send_message(&UpdateMessage::TimeLimitChanged { time_limit: limit }.into());
    }

    /// Returns the snapshot a (re)attaching renderer needs for the
    /// current screen
    pub fn state_message(&self) -> crate::SyncMessage {
        match self.screen {
            Screen::ModeSelect => SyncMessage::ModeSelect.into(),
            Screen::LevelSelect => match self.mode {
                Some(mode) => SyncMessage::LevelSelect { mode }.into(),
                // unreachable through the transition graph; resync from the top
                None => SyncMessage::ModeSelect.into(),
            },
            Screen::CategorySelect => SyncMessage::CategorySelect {
                categories: Category::ALL.to_vec(),
            }
            .into(),
            Screen::OtherGames => SyncMessage::OtherGames {
                games: other_games::builtin(),
            }
            .into(),
            Screen::Playing => match self.mode {
                Some(mode) => SyncMessage::Playing {
                    mode,
                    level: self.selected_level,
                    category: self.selected_category,
                    deck: self.deck.order().to_vec(),
                    position: self.deck.position(),
                    is_shuffling: self.deck.is_shuffling(),
                    question: self.current_question.clone(),
                    time_limit: self.time_limit,
                    remaining_time: self.countdown.remaining(),
                }
                .into(),
                // unreachable through the transition graph; resync from the top
                None => SyncMessage::ModeSelect.into(),
            },
        }
    }

    /// Pushes the current screen snapshot to a (re)attaching renderer
    ///
    /// Used when the presentation layer connects after the session already
    /// exists, or falls behind the update stream and needs to
    /// resynchronize.
    pub fn update_presentation<P: Presenter>(&self, presenter: &P) {
        presenter.send_state(&self.state_message());
    }

    /// Chooses a game mode on the mode-select screen
    fn select_mode<P: Presenter>(&mut self, mode: Mode, presenter: &P) {
        self.mode = Some(mode);

        match mode {
            Mode::LevelUp => {
                // level-up always climbs from the bottom
                self.selected_level = Level::One;
                self.turn_count = 0;
                self.enter_playing(mode, presenter);
            }
            Mode::Category => {
                self.screen = Screen::CategorySelect;
                presenter.send_message(
                    &UpdateMessage::CategorySelect {
                        categories: Category::ALL.to_vec(),
                    }
                    .into(),
                );
            }
            Mode::Random | Mode::Manual => {
                self.screen = Screen::LevelSelect;
                presenter.send_message(&UpdateMessage::LevelSelect { mode }.into());
            }
        }
    }

    /// Opens the other-games browser
    fn open_other_games<P: Presenter>(&mut self, presenter: &P) {
        self.screen = Screen::OtherGames;
        presenter.send_message(
            &UpdateMessage::OtherGames {
                games: other_games::builtin(),
            }
            .into(),
        );
    }

    /// Chooses a level on the level-select screen
    fn select_level<P: Presenter>(&mut self, level: Level, presenter: &P) {
        self.selected_level = level;
        if let Some(mode) = self.mode {
            self.enter_playing(mode, presenter);
        }
    }

    /// Chooses a category on the category-select screen
    fn select_category<P: Presenter>(&mut self, category: Category, presenter: &P) {
        self.selected_category = Some(category);
        if let Some(mode) = self.mode {
            self.enter_playing(mode, presenter);
        }
    }

    /// Returns to the mode-select screen from a picker or browser screen
    fn back_to_mode_select<P: Presenter>(&mut self, presenter: &P) {
        self.screen = Screen::ModeSelect;
        presenter.send_message(&UpdateMessage::ModeSelect.into());
    }

    /// Starts a round on the playing screen
    ///
    /// Manual mode shuffles the active pool once for browsing; the reveal
    /// modes start with an empty deck and reshuffle per draw.
    fn enter_playing<P: Presenter>(&mut self, mode: Mode, presenter: &P) {
        self.screen = Screen::Playing;

        if matches!(mode, Mode::Manual) {
            let pool = self.active_pool();
            self.deck.rebuild(&pool);
        } else {
            self.deck.clear();
        }

        presenter.send_message(
            &UpdateMessage::Playing {
                mode,
                level: self.selected_level,
                category: self.selected_category,
                deck: self.deck.order().to_vec(),
                time_limit: self.time_limit,
            }
            .into(),
        );
    }

    /// Reveal discipline: draws a card from the active pool
    fn show_question<P: Presenter, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        schedule_message: S,
        presenter: &P,
    ) {
        let pool = self.active_pool();
        if let Some(question) = self.deck.draw(&pool) {
            self.select_question(question, schedule_message, presenter);
        }
    }

    /// Browse discipline: selects the card at the new slide position
    ///
    /// Suppressed while a reshuffle is displaying, so the slide jump of
    /// the transition cannot select a card.
    fn slide_change<P: Presenter, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        schedule_message: S,
        presenter: &P,
    ) {
        if let Some(question) = self.deck.browse_select(index) {
            let question = question.clone();
            self.select_question(question, schedule_message, presenter);
        }
    }

    /// Starts a busy-gated reshuffle of the browse deck
    fn shuffle_deck<P: Presenter, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        mut schedule_message: S,
        presenter: &P,
    ) {
        if let Some(generation) = self.deck.begin_reshuffle() {
            presenter.send_message(&deck::UpdateMessage::ShuffleStarted.into());
            schedule_message(
                deck::AlarmMessage::ShuffleSettled { generation }.into(),
                constants::deck::SHUFFLE_DELAY,
            );
        }
    }

    /// The question pool for the active mode and selection
    fn active_pool(&self) -> Vec<Question> {
        match self.mode {
            Some(Mode::Category) => self
                .selected_category
                .map(|category| self.bank.category_pool(category).to_vec())
                .unwrap_or_default(),
            _ => self.bank.level_pool(self.selected_level).to_vec(),
        }
    }

    /// Returns the active screen
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Returns the selected mode, `None` until one is chosen
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Returns the active level
    pub fn selected_level(&self) -> Level {
        self.selected_level
    }

    /// Returns the active category, while playing in category mode
    pub fn selected_category(&self) -> Option<Category> {
        self.selected_category
    }

    /// Returns the question on display, if one was revealed
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// Returns the turns taken at the current level (level-up mode)
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Returns the configured countdown length in seconds
    pub fn time_limit(&self) -> Option<u32> {
        self.time_limit
    }

    /// Returns the seconds left on the countdown, while a timed question
    /// is shown
    pub fn remaining_time(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    /// Returns the browse deck
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Returns the question bank
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    use itertools::Itertools;

    use super::*;
    use crate::question::{CategoryQuestion, LeveledQuestion};

    // Test helpers for mock implementations
    #[derive(Debug, Clone, Default)]
    struct MockPresenter {
        messages: Rc<RefCell<Vec<crate::UpdateMessage>>>,
        states: Rc<RefCell<Vec<crate::SyncMessage>>>,
    }

    impl Presenter for MockPresenter {
        fn send_message(&self, message: &crate::UpdateMessage) {
            self.messages.borrow_mut().push(message.clone());
        }

        fn send_state(&self, state: &crate::SyncMessage) {
            self.states.borrow_mut().push(state.clone());
        }

        fn close(self) {}
    }

    impl MockPresenter {
        fn tick_count(&self) -> usize {
            self.messages
                .borrow()
                .iter()
                .filter(|m| {
                    matches!(
                        m,
                        crate::UpdateMessage::Session(UpdateMessage::TimerTick { .. })
                    )
                })
                .count()
        }

        fn shuffled_count(&self) -> usize {
            self.messages
                .borrow()
                .iter()
                .filter(|m| {
                    matches!(
                        m,
                        crate::UpdateMessage::Deck(deck::UpdateMessage::Shuffled { .. })
                    )
                })
                .count()
        }
    }

    type AlarmQueue = Rc<RefCell<VecDeque<(crate::AlarmMessage, Duration)>>>;

    fn scheduler(queue: &AlarmQueue) -> impl FnMut(crate::AlarmMessage, Duration) + use<> {
        let queue = Rc::clone(queue);
        move |message, duration| queue.borrow_mut().push_back((message, duration))
    }

    /// Delivers queued alarms until none remain, returning how many fired
    fn drain_alarms(session: &mut Session, queue: &AlarmQueue, presenter: &MockPresenter) -> usize {
        let mut fired = 0;
        loop {
            let next = queue.borrow_mut().pop_front();
            let Some((alarm, _)) = next else {
                return fired;
            };
            fired += 1;
            session.receive_alarm(alarm, scheduler(queue), presenter);
        }
    }

    fn test_bank() -> QuestionBank {
        let leveled = |id, level, text: &str| LeveledQuestion {
            id,
            level,
            text: text.to_owned(),
        };
        let categorized = |id, category, text: &str| CategoryQuestion {
            id,
            category,
            text: text.to_owned(),
        };

        QuestionBank::new(
            vec![
                leveled(1, Level::One, "好きな食べ物は？"),
                leveled(2, Level::One, "最近笑ったことは？"),
                leveled(3, Level::One, "休日の過ごし方は？"),
                leveled(4, Level::One, "子供の頃の夢は？"),
                leveled(5, Level::One, "朝型？夜型？"),
                leveled(6, Level::Two, "人生で一番の決断は？"),
                leveled(7, Level::Two, "大事にしている価値観は？"),
                leveled(8, Level::Three, "今まで言えなかった本音は？"),
            ],
            vec![
                categorized(1, Category::Hobby, "最近ハマってることは？"),
                categorized(2, Category::Hobby, "一生続けたい趣味は？"),
                categorized(3, Category::Hobby, "子供の頃の趣味は？"),
                categorized(4, Category::Love, "初恋はいつ？"),
            ],
        )
        .unwrap()
    }

    fn playing_random(session: &mut Session, presenter: &MockPresenter) {
        let queue: AlarmQueue = Rc::default();
        session.receive_message(
            IncomingMessage::SelectMode(Mode::Random),
            scheduler(&queue),
            presenter,
        );
        session.receive_message(
            IncomingMessage::SelectLevel(Level::One),
            scheduler(&queue),
            presenter,
        );
    }

    fn playing_manual(session: &mut Session, presenter: &MockPresenter) {
        let queue: AlarmQueue = Rc::default();
        session.receive_message(
            IncomingMessage::SelectMode(Mode::Manual),
            scheduler(&queue),
            presenter,
        );
        session.receive_message(
            IncomingMessage::SelectLevel(Level::One),
            scheduler(&queue),
            presenter,
        );
    }

    #[test]
    fn test_initial_state() {
        let session = Session::new(test_bank());

        assert_eq!(session.screen(), Screen::ModeSelect);
        assert_eq!(session.mode(), None);
        assert_eq!(session.selected_level(), Level::One);
        assert_eq!(session.selected_category(), None);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.turn_count(), 0);
        assert_eq!(
            session.time_limit(),
            Some(constants::session::DEFAULT_TIME_LIMIT)
        );
        assert_eq!(session.remaining_time(), None);
    }

    #[test]
    fn test_levelup_mode_goes_straight_to_playing() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::LevelUp),
            scheduler(&queue),
            &presenter,
        );

        assert_eq!(session.screen(), Screen::Playing);
        assert_eq!(session.mode(), Some(Mode::LevelUp));
        assert_eq!(session.selected_level(), Level::One);
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn test_random_and_manual_go_to_level_select() {
        for mode in [Mode::Random, Mode::Manual] {
            let mut session = Session::new(test_bank());
            let presenter = MockPresenter::default();
            let queue: AlarmQueue = Rc::default();

            session.receive_message(
                IncomingMessage::SelectMode(mode),
                scheduler(&queue),
                &presenter,
            );

            assert_eq!(session.screen(), Screen::LevelSelect);
            assert_eq!(session.mode(), Some(mode));
        }
    }

    #[test]
    fn test_category_mode_goes_to_category_select() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Category),
            scheduler(&queue),
            &presenter,
        );

        assert_eq!(session.screen(), Screen::CategorySelect);
        // not set until a category is actually picked
        assert_eq!(session.selected_category(), None);
    }

    #[test]
    fn test_other_games_browser_and_back() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::OpenOtherGames,
            scheduler(&queue),
            &presenter,
        );
        assert_eq!(session.screen(), Screen::OtherGames);
        assert_eq!(session.mode(), None);

        session.receive_message(IncomingMessage::Back, scheduler(&queue), &presenter);
        assert_eq!(session.screen(), Screen::ModeSelect);
    }

    #[test]
    fn test_back_from_pickers() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Random),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::Back, scheduler(&queue), &presenter);
        assert_eq!(session.screen(), Screen::ModeSelect);

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Category),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::Back, scheduler(&queue), &presenter);
        assert_eq!(session.screen(), Screen::ModeSelect);
        assert_eq!(session.selected_category(), None);
    }

    #[test]
    fn test_manual_play_builds_browse_deck() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();

        playing_manual(&mut session, &presenter);

        assert_eq!(session.screen(), Screen::Playing);
        let ids = session
            .deck()
            .order()
            .iter()
            .map(Question::id)
            .sorted()
            .collect_vec();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_category_play_scenario() {
        // category 趣味, pool ids {1,2,3}, limit 10: a reveal draws one of
        // the pool and arms the countdown; ten ticks run it to zero
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Category),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(
            IncomingMessage::SelectCategory(Category::Hobby),
            scheduler(&queue),
            &presenter,
        );
        assert_eq!(session.selected_category(), Some(Category::Hobby));

        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);

        let question = session.current_question().unwrap();
        assert!([1, 2, 3].contains(&question.id()));
        assert_eq!(question.badge(), "趣味");
        assert_eq!(session.remaining_time(), Some(10));

        let fired = drain_alarms(&mut session, &queue, &presenter);
        assert_eq!(fired, 10);
        assert_eq!(session.remaining_time(), Some(0));
        assert_eq!(presenter.tick_count(), 10);
    }

    #[test]
    fn test_levelup_progression() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::LevelUp),
            scheduler(&queue),
            &presenter,
        );

        // every Next counts a turn, question shown or not
        for _ in 0..4 {
            session.receive_message(IncomingMessage::Next, scheduler(&queue), &presenter);
        }
        assert_eq!(session.selected_level(), Level::Two);
        assert_eq!(session.turn_count(), 0);

        for _ in 0..6 {
            session.receive_message(IncomingMessage::Next, scheduler(&queue), &presenter);
        }
        assert_eq!(session.selected_level(), Level::Three);
        assert_eq!(session.turn_count(), 0);

        // the top level never advances; the count grows without bound
        for _ in 0..9 {
            session.receive_message(IncomingMessage::Next, scheduler(&queue), &presenter);
        }
        assert_eq!(session.selected_level(), Level::Three);
        assert_eq!(session.turn_count(), 9);
    }

    #[test]
    fn test_next_clears_question_and_countdown() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_random(&mut session, &presenter);
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);
        assert!(session.current_question().is_some());
        assert_eq!(session.remaining_time(), Some(10));

        session.receive_message(IncomingMessage::Next, scheduler(&queue), &presenter);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.remaining_time(), None);
        // random mode takes no turns
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn test_stale_tick_after_next_is_inert() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_random(&mut session, &presenter);
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);
        session.receive_message(IncomingMessage::Next, scheduler(&queue), &presenter);

        // the tick scheduled for the cleared question still arrives
        let fired = drain_alarms(&mut session, &queue, &presenter);
        assert_eq!(fired, 1);
        assert_eq!(session.remaining_time(), None);
        assert_eq!(presenter.tick_count(), 0);
    }

    #[test]
    fn test_new_reveal_supersedes_countdown() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_random(&mut session, &presenter);
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);

        // first alarm is stale, second runs the fresh countdown down
        let first = queue.borrow_mut().pop_front().unwrap().0;
        session.receive_alarm(first, scheduler(&queue), &presenter);
        assert_eq!(session.remaining_time(), Some(10));

        let second = queue.borrow_mut().pop_front().unwrap().0;
        session.receive_alarm(second, scheduler(&queue), &presenter);
        assert_eq!(session.remaining_time(), Some(9));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Category),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(
            IncomingMessage::SelectCategory(Category::Hobby),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(
            IncomingMessage::SetTimeLimit(Some(15)),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);

        session.receive_message(IncomingMessage::EndGame, scheduler(&queue), &presenter);

        assert_eq!(session.screen(), Screen::ModeSelect);
        assert_eq!(session.mode(), None);
        assert_eq!(session.selected_level(), Level::One);
        assert_eq!(session.selected_category(), None);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.turn_count(), 0);
        assert_eq!(
            session.time_limit(),
            Some(constants::session::DEFAULT_TIME_LIMIT)
        );
        assert_eq!(session.remaining_time(), None);
        assert!(session.deck().order().is_empty());
    }

    #[test]
    fn test_mode_isolation_after_reset() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Category),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(
            IncomingMessage::SelectCategory(Category::Love),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::EndGame, scheduler(&queue), &presenter);

        playing_random(&mut session, &presenter);

        assert_eq!(session.mode(), Some(Mode::Random));
        assert_eq!(session.selected_category(), None);
    }

    #[test]
    fn test_manual_slide_change_selects_and_times() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_manual(&mut session, &presenter);
        session.receive_message(
            IncomingMessage::SlideChange(2),
            scheduler(&queue),
            &presenter,
        );

        let expected = session.deck().order()[2].clone();
        assert_eq!(session.current_question(), Some(&expected));
        assert_eq!(session.remaining_time(), Some(10));
    }

    #[test]
    fn test_manual_reshuffle_scenario() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_manual(&mut session, &presenter);
        let before = session
            .deck()
            .order()
            .iter()
            .map(Question::id)
            .sorted()
            .collect_vec();

        session.receive_message(IncomingMessage::Shuffle, scheduler(&queue), &presenter);
        assert!(session.deck().is_shuffling());
        assert_eq!(queue.borrow().len(), 1);
        assert_eq!(
            queue.borrow().front().unwrap().1,
            constants::deck::SHUFFLE_DELAY
        );

        // the transition's slide jump must not select a card
        session.receive_message(
            IncomingMessage::SlideChange(1),
            scheduler(&queue),
            &presenter,
        );
        assert_eq!(session.current_question(), None);

        drain_alarms(&mut session, &queue, &presenter);
        assert!(!session.deck().is_shuffling());
        assert_eq!(presenter.shuffled_count(), 1);

        let after = session
            .deck()
            .order()
            .iter()
            .map(Question::id)
            .sorted()
            .collect_vec();
        assert_eq!(before, after);
        assert_eq!(session.deck().position(), 0);
    }

    #[test]
    fn test_reshuffle_gated_while_in_flight() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_manual(&mut session, &presenter);
        session.receive_message(IncomingMessage::Shuffle, scheduler(&queue), &presenter);
        session.receive_message(IncomingMessage::Shuffle, scheduler(&queue), &presenter);

        // the second press scheduled nothing
        assert_eq!(queue.borrow().len(), 1);
    }

    #[test]
    fn test_stale_shuffle_after_reset_is_inert() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_manual(&mut session, &presenter);
        session.receive_message(IncomingMessage::Shuffle, scheduler(&queue), &presenter);
        session.receive_message(IncomingMessage::EndGame, scheduler(&queue), &presenter);

        drain_alarms(&mut session, &queue, &presenter);
        assert!(session.deck().order().is_empty());
        assert_eq!(presenter.shuffled_count(), 0);
    }

    #[test]
    fn test_set_time_limit_spares_live_countdown() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_random(&mut session, &presenter);
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);
        session.receive_message(
            IncomingMessage::SetTimeLimit(Some(5)),
            scheduler(&queue),
            &presenter,
        );

        // the countdown keeps running from its original limit
        let alarm = queue.borrow_mut().pop_front().unwrap().0;
        session.receive_alarm(alarm, scheduler(&queue), &presenter);
        assert_eq!(session.remaining_time(), Some(9));

        // the new limit applies from the next reveal
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);
        assert_eq!(session.remaining_time(), Some(5));
    }

    #[test]
    fn test_untimed_play_schedules_nothing() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_random(&mut session, &presenter);
        session.receive_message(
            IncomingMessage::SetTimeLimit(None),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);

        assert!(session.current_question().is_some());
        assert_eq!(session.remaining_time(), None);
        assert!(queue.borrow().is_empty());
    }

    #[test]
    fn test_reveal_on_empty_pool_is_benign() {
        let bank = QuestionBank::new(
            vec![LeveledQuestion {
                id: 1,
                level: Level::One,
                text: "a".to_owned(),
            }],
            vec![],
        )
        .unwrap();
        let mut session = Session::new(bank);
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Random),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(
            IncomingMessage::SelectLevel(Level::Two),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);

        assert_eq!(session.current_question(), None);
        assert_eq!(session.remaining_time(), None);
    }

    #[test]
    fn test_inputs_ignored_on_wrong_screen() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        // level pick and reveal mean nothing on the mode-select screen
        session.receive_message(
            IncomingMessage::SelectLevel(Level::Three),
            scheduler(&queue),
            &presenter,
        );
        session.receive_message(IncomingMessage::ShowQuestion, scheduler(&queue), &presenter);
        assert_eq!(session.screen(), Screen::ModeSelect);
        assert_eq!(session.selected_level(), Level::One);
        assert_eq!(session.current_question(), None);
    }

    #[test]
    fn test_next_ignored_in_manual_mode() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        playing_manual(&mut session, &presenter);
        session.receive_message(
            IncomingMessage::SlideChange(0),
            scheduler(&queue),
            &presenter,
        );
        assert!(session.current_question().is_some());

        session.receive_message(IncomingMessage::Next, scheduler(&queue), &presenter);
        assert!(session.current_question().is_some());
    }

    #[test]
    fn test_update_presentation_sends_snapshot() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        session.update_presentation(&presenter);
        session.receive_message(
            IncomingMessage::SelectMode(Mode::LevelUp),
            scheduler(&queue),
            &presenter,
        );
        session.update_presentation(&presenter);

        let states = presenter.states.borrow();
        assert_eq!(states.len(), 2);
        assert!(matches!(
            states[0],
            crate::SyncMessage::Session(SyncMessage::ModeSelect)
        ));
        assert!(matches!(
            states[1],
            crate::SyncMessage::Session(SyncMessage::Playing { .. })
        ));
    }

    #[test]
    fn test_state_message_tracks_screen() {
        let mut session = Session::new(test_bank());
        let presenter = MockPresenter::default();
        let queue: AlarmQueue = Rc::default();

        assert!(matches!(
            session.state_message(),
            crate::SyncMessage::Session(SyncMessage::ModeSelect)
        ));

        session.receive_message(
            IncomingMessage::SelectMode(Mode::Manual),
            scheduler(&queue),
            &presenter,
        );
        assert!(matches!(
            session.state_message(),
            crate::SyncMessage::Session(SyncMessage::LevelSelect { mode: Mode::Manual })
        ));

        session.receive_message(
            IncomingMessage::SelectLevel(Level::One),
            scheduler(&queue),
            &presenter,
        );
        match session.state_message() {
            crate::SyncMessage::Session(SyncMessage::Playing {
                mode,
                level,
                deck,
                question,
                is_shuffling,
                ..
            }) => {
                assert_eq!(mode, Mode::Manual);
                assert_eq!(level, Level::One);
                assert_eq!(deck.len(), 5);
                assert_eq!(question, None);
                assert!(!is_shuffling);
            }
            other => panic!("unexpected sync message: {other:?}"),
        }
    }
}
