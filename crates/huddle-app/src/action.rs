//! Session side-effects and intents.
//!
//! This module defines the [`ChatAction`] enum, which represents instructions
//! produced by the [`crate::ChatSession`] state machine for the runtime to
//! execute.

use std::time::Duration;

use huddle_core::RoomId;

use crate::{LoadTicket, TempId};

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Render the session.
    Render,

    /// Force the message list to its newest entry.
    ScrollToBottom,

    /// Move the route to a room (explicit selection).
    Navigate {
        /// Selected room.
        room_id: RoomId,
    },

    /// Fetch the room directory.
    FetchRooms {
        /// Domain filter.
        domain: Option<String>,
    },

    /// Join a room, then fetch its history.
    LoadRoom {
        /// Activation key the result must carry back.
        ticket: LoadTicket,
    },

    /// Refetch history of an already joined room.
    RefreshRoom {
        /// Activation key the result must carry back.
        ticket: LoadTicket,
        /// Refresh sequence number the result must carry back.
        seq: u64,
    },

    /// Post a message.
    SendMessage {
        /// Target room.
        room_id: RoomId,
        /// Temporary id of the provisional entry.
        temp_id: TempId,
        /// Trimmed body.
        body: String,
    },

    /// Start the highlight rotation timer.
    StartRotation {
        /// Tick interval.
        interval: Duration,
    },

    /// Tear down the highlight rotation timer.
    StopRotation,

    /// Start the history polling timer.
    StartPolling {
        /// Tick interval.
        interval: Duration,
    },

    /// Tear down the history polling timer.
    StopPolling,
}

impl ChatAction {
    /// Action is a backend request.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::FetchRooms { .. }
                | Self::LoadRoom { .. }
                | Self::RefreshRoom { .. }
                | Self::SendMessage { .. }
        )
    }
}
