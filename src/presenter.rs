//! Rendering collaborator contract
//!
//! This module defines the trait for pushing state to the presentation
//! layer (the card-swipe renderer, buttons, timer display). The trait
//! abstraction keeps the dependency one-way: the presentation layer
//! depends on the core, never the reverse, and any renderer — a web view,
//! a TUI, a test capture — can sit on the other side.

use super::{SyncMessage, UpdateMessage};

/// Trait for pushing state to the presentation layer
///
/// Implementations render the messages however they like; the core only
/// guarantees that every state mutation is announced through here before
/// the operation returns.
pub trait Presenter {
    /// Sends an update message to the renderer
    ///
    /// Update messages announce deltas: a screen switch, a revealed
    /// question, a countdown tick, a settled reshuffle.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to render
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full state snapshot to the renderer
    ///
    /// Snapshots carry everything the active screen needs, for a renderer
    /// that is (re)attaching rather than following deltas.
    ///
    /// # Arguments
    ///
    /// * `state` - The snapshot to render
    fn send_state(&self, state: &SyncMessage);

    /// Closes the channel to the renderer
    ///
    /// Called when the presentation layer detaches and no further
    /// messages should be delivered.
    fn close(self);
}
