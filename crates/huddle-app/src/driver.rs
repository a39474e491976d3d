//! Driver trait for abstracting the view layer.
//!
//! The [`Driver`] trait decouples the chat runtime from a specific frontend.
//! Each frontend implements the trait to provide input, rendering and
//! viewport access, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use huddle_core::RoomId;

use crate::{ChatEvent, ChatSession, ScrollMetrics};

/// Abstracts the view side of a chat session.
///
/// # Implementations
///
/// - **CLI**: line-based terminal input, no viewport
/// - **Simulation**: scripted input and a modelled viewport (`huddle-harness`)
/// - **Web**: could use DOM events and element scroll metrics
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next user input.
    ///
    /// Returns `None` when the view is closed; the runtime then unmounts the
    /// session. Must be cancellation safe: the runtime polls it alongside
    /// network completions and timers.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<ChatEvent>, Self::Error>> + Send;

    /// Current metrics of the message list. `None` if there is no viewport.
    fn viewport(&self) -> Option<ScrollMetrics>;

    /// Render the session.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, session: &ChatSession) -> Result<(), Self::Error>;

    /// Scroll the message list to its newest entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the viewport cannot be updated.
    fn scroll_to_bottom(&mut self) -> Result<(), Self::Error>;

    /// Reflect an explicit room selection in the route.
    fn navigate(&mut self, room_id: RoomId);

    /// Release view resources.
    fn stop(&mut self);
}
