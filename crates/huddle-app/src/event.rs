//! Session input events.
//!
//! This module defines [`ChatEvent`], the set of inputs that drive the
//! [`crate::ChatSession`] state machine.
//!
//! Events originate from three sources:
//! - User interactions forwarded by the driver (selection, hover, typing).
//! - Completed backend requests, carrying the key captured at request time.
//! - Timers owned by the runtime (rotation and polling ticks).

use huddle_core::{ChatError, Message, Room, RoomId};

use crate::{Interaction, LoadTicket, TempId};

/// Events processed by the session state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// User clicked a room.
    SelectRoom(RoomId),

    /// User hovered a room (embedded widget).
    HoverRoom(RoomId),

    /// Route parameter changed (full page).
    RouteChanged(Option<RoomId>),

    /// Pointer, touch, focus or scroll inside the widget.
    Interaction(Interaction),

    /// Draft input changed.
    DraftChanged(String),

    /// User submitted the draft.
    Submit,

    /// User asked to refetch the room directory.
    ReloadDirectory,

    /// Room directory fetch completed.
    DirectoryLoaded(Result<Vec<Room>, ChatError>),

    /// Join and history fetch completed.
    RoomLoaded {
        /// Activation this result belongs to.
        ticket: LoadTicket,
        /// History, oldest first.
        result: Result<Vec<Message>, ChatError>,
    },

    /// Periodic history refresh completed.
    RoomRefreshed {
        /// Activation this result belongs to.
        ticket: LoadTicket,
        /// Refresh sequence number of the request.
        seq: u64,
        /// History, oldest first.
        result: Result<Vec<Message>, ChatError>,
    },

    /// Send completed.
    MessageSent {
        /// Room the message was sent to.
        room_id: RoomId,
        /// Temporary id of the provisional entry.
        temp_id: TempId,
        /// Server-confirmed message.
        result: Result<Message, ChatError>,
    },

    /// Highlight rotation timer fired.
    RotationTick,

    /// History polling timer fired.
    PollTick,
}
