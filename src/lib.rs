//! # Talkup Game Library
//!
//! This library provides the core game logic for a conversation card game:
//! question prompts grouped by difficulty level or topic category, drawn at
//! random or browsed by hand from a shuffled deck, with an optional
//! countdown per question. It owns the session state machine (mode and
//! screen transitions, level-up progression, timer lifecycle) and drives an
//! external presentation layer through a small message contract; rendering
//! itself lives entirely outside this crate.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod deck;
pub mod other_games;
pub mod presenter;
pub mod question;
pub mod session;
pub mod timer;

/// Messages sent to the presentation layer about state changes
///
/// This enum gathers the update messages of every component that announces
/// changes, so the presenter receives one uniform stream.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Session controller updates (screens, questions, countdown)
    Session(session::UpdateMessage),
    /// Question deck updates (reshuffle lifecycle)
    Deck(deck::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Full state snapshots for a (re)attaching presentation layer
///
/// Sent when a renderer connects or resynchronizes rather than following
/// individual updates.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Session controller snapshots (one per screen)
    Session(session::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// These are handed to the embedding runtime's scheduler and delivered back
/// through [`session::Session::receive_alarm`] after their delay.
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown ticks
    Session(session::AlarmMessage),
    /// Reshuffle settling
    Deck(deck::AlarmMessage),
}
