//! Question data model and validated question banks
//!
//! This module defines the two kinds of question cards the game presents
//! (difficulty-leveled and topic-categorized), and the `QuestionBank` that
//! holds the static datasets handed in by the embedding layer. Banks are
//! validated on construction and pre-indexed per level and per category so
//! the session controller can hand pools to the deck without re-filtering.

use std::fmt::Display;

use enum_map::{Enum, EnumMap};
use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Difficulty/intimacy tier partitioning the level-based question pool
///
/// Levels are serialized as the integers 1 to 3, matching the dataset
/// format. Progression through levels is monotonic; see the session
/// controller for the level-up rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    /// Level 1, icebreaker questions
    One,
    /// Level 2, questions about values
    Two,
    /// Level 3, deep questions
    Three,
}

/// Error returned when a dataset carries a level outside 1 to 3
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("level must be 1, 2, or 3")]
pub struct InvalidLevel;

impl Level {
    /// Returns the next level up, or `None` at the top level
    pub fn next(self) -> Option<Self> {
        match self {
            Self::One => Some(Self::Two),
            Self::Two => Some(Self::Three),
            Self::Three => None,
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        match level {
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            _ => Err(InvalidLevel),
        }
    }
}

impl Display for Level {
    /// Formats the level as its numeric tier
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Topic label partitioning the category-based question pool
///
/// The set is fixed by the category dataset; categories serialize as their
/// Japanese display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Category {
    /// Questions about romance
    #[serde(rename = "恋愛")]
    Love,
    /// Questions about hobbies
    #[serde(rename = "趣味")]
    Hobby,
    /// Questions about work
    #[serde(rename = "仕事")]
    Work,
    /// Questions about memories
    #[serde(rename = "思い出")]
    Memories,
    /// Questions about personal values
    #[serde(rename = "価値観")]
    Values,
    /// Hypothetical "what if" questions
    #[serde(rename = "もしも")]
    WhatIf,
}

impl Category {
    /// All categories, in presentation order
    pub const ALL: [Self; 6] = [
        Self::Love,
        Self::Hobby,
        Self::Work,
        Self::Memories,
        Self::Values,
        Self::WhatIf,
    ];

    /// Returns the display label for this category
    pub fn label(self) -> &'static str {
        match self {
            Self::Love => "恋愛",
            Self::Hobby => "趣味",
            Self::Work => "仕事",
            Self::Memories => "思い出",
            Self::Values => "価値観",
            Self::WhatIf => "もしも",
        }
    }
}

impl Display for Category {
    /// Formats the category as its display label
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A question from the level-keyed dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LeveledQuestion {
    /// Identifier, unique within the level-keyed collection
    #[garde(skip)]
    pub id: u32,
    /// The difficulty tier this question belongs to
    #[garde(skip)]
    pub level: Level,
    /// The prompt shown on the card
    #[garde(length(min = crate::constants::question::MIN_TEXT_LENGTH, max = crate::constants::question::MAX_TEXT_LENGTH))]
    pub text: String,
}

/// A question from the category-keyed dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CategoryQuestion {
    /// Identifier, unique within the category-keyed collection
    #[garde(skip)]
    pub id: u32,
    /// The topic this question belongs to
    #[garde(skip)]
    pub category: Category,
    /// The prompt shown on the card
    #[garde(length(min = crate::constants::question::MIN_TEXT_LENGTH, max = crate::constants::question::MAX_TEXT_LENGTH))]
    pub text: String,
}

/// A question card of either kind
///
/// The two dataset shapes are distinguished by their `level`/`category`
/// field, so the union is serialized untagged. Everything that consumes a
/// question matches on the variant exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(untagged)]
pub enum Question {
    /// A question drawn from the level-keyed pool
    Leveled(#[garde(dive)] LeveledQuestion),
    /// A question drawn from the category-keyed pool
    Category(#[garde(dive)] CategoryQuestion),
}

impl Question {
    /// Returns the question identifier
    pub fn id(&self) -> u32 {
        match self {
            Self::Leveled(question) => question.id,
            Self::Category(question) => question.id,
        }
    }

    /// Returns the prompt text shown on the card
    pub fn text(&self) -> &str {
        match self {
            Self::Leveled(question) => &question.text,
            Self::Category(question) => &question.text,
        }
    }

    /// Returns the badge label displayed above the card
    ///
    /// Category questions are badged with their topic label, leveled
    /// questions with their tier.
    pub fn badge(&self) -> String {
        match self {
            Self::Leveled(question) => format!("レベル {}", question.level),
            Self::Category(question) => question.category.to_string(),
        }
    }
}

/// Errors that can occur while ingesting question datasets
#[derive(Error, Debug)]
pub enum Error {
    /// The dataset is not well-formed JSON for the expected shape
    #[error("malformed question data: {0}")]
    Parse(#[from] serde_json::Error),
    /// The dataset parsed but failed validation
    #[error("invalid question data: {0}")]
    Invalid(#[from] garde::Report),
}

/// Checks that every id in a collection appears exactly once
fn unique_ids<I: Iterator<Item = u32>>(ids: I) -> garde::Result {
    match ids.duplicates().next() {
        Some(id) => Err(garde::Error::new(format!("duplicate question id {id}"))),
        None => Ok(()),
    }
}

/// Serialization shape for [`QuestionBank`]
///
/// Mirrors the dataset files: a flat list of leveled questions and a flat
/// list of category questions. Validation runs here, before the bank's
/// per-level and per-category indexes are built.
#[derive(Debug, Deserialize, Validate)]
struct BankSerde {
    /// The level-keyed collection
    #[garde(custom(|v: &Vec<LeveledQuestion>, _| unique_ids(v.iter().map(|q| q.id))), dive)]
    questions: Vec<LeveledQuestion>,
    /// The category-keyed collection
    #[garde(custom(|v: &Vec<CategoryQuestion>, _| unique_ids(v.iter().map(|q| q.id))), dive)]
    category_questions: Vec<CategoryQuestion>,
}

/// The static question datasets, validated and indexed for play
///
/// A bank holds both collections the game draws from: one keyed by level
/// and one keyed by category. It is read-only once constructed; the
/// session controller borrows pools out of it to feed the deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BankSerde")]
pub struct QuestionBank {
    /// The level-keyed collection as provided
    #[serde(rename = "questions")]
    leveled: Vec<LeveledQuestion>,
    /// The category-keyed collection as provided
    #[serde(rename = "category_questions")]
    categorized: Vec<CategoryQuestion>,
    /// Questions grouped by level, in dataset order
    #[serde(skip)]
    by_level: EnumMap<Level, Vec<Question>>,
    /// Questions grouped by category, in dataset order
    #[serde(skip)]
    by_category: EnumMap<Category, Vec<Question>>,
}

impl TryFrom<BankSerde> for QuestionBank {
    type Error = Error;

    /// Validates the raw dataset and builds the per-level and per-category
    /// indexes
    fn try_from(serde: BankSerde) -> Result<Self, Self::Error> {
        serde.validate()?;

        let BankSerde {
            questions,
            category_questions,
        } = serde;

        let mut by_level: EnumMap<Level, Vec<Question>> = EnumMap::default();
        for question in &questions {
            by_level[question.level].push(Question::Leveled(question.clone()));
        }

        let mut by_category: EnumMap<Category, Vec<Question>> = EnumMap::default();
        for question in &category_questions {
            by_category[question.category].push(Question::Category(question.clone()));
        }

        Ok(Self {
            leveled: questions,
            categorized: category_questions,
            by_level,
            by_category,
        })
    }
}

impl QuestionBank {
    /// Builds a bank from the two collections
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] if any question text is empty or too
    /// long, or if an id repeats within its collection.
    pub fn new(
        leveled: Vec<LeveledQuestion>,
        categorized: Vec<CategoryQuestion>,
    ) -> Result<Self, Error> {
        BankSerde {
            questions: leveled,
            category_questions: categorized,
        }
        .try_into()
    }

    /// Parses and validates a bank from its JSON dataset form
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the JSON is malformed, or
    /// [`Error::Invalid`] if the parsed data fails validation.
    pub fn from_json(data: &str) -> Result<Self, Error> {
        let bank: BankSerde = serde_json::from_str(data)?;
        bank.try_into()
    }

    /// Returns the pool of questions for a level
    pub fn level_pool(&self, level: Level) -> &[Question] {
        &self.by_level[level]
    }

    /// Returns the pool of questions for a category
    pub fn category_pool(&self, category: Category) -> &[Question] {
        &self.by_category[category]
    }

    /// Returns the level-keyed collection as provided
    pub fn leveled(&self) -> &[LeveledQuestion] {
        &self.leveled
    }

    /// Returns the category-keyed collection as provided
    pub fn categorized(&self) -> &[CategoryQuestion] {
        &self.categorized
    }
}
