//! Observable session state types.
//!
//! These structures are the "View Model" of the chat session: the room
//! directory, the lifecycle of the active room, and the entries rendered in
//! the message list. Drivers read them through [`crate::ChatSession`]
//! accessors; only the session mutates them.

use std::fmt;

use chrono::{DateTime, Utc};
use huddle_core::{ChatUser, Message, MessageId, Room, RoomId, UserId};

/// Display name for the local author when the signed-in user is unknown.
pub const PLACEHOLDER_AUTHOR_NAME: &str = "You";

/// Locally generated identifier of a provisional message.
///
/// Allocated from a per-session monotonic counter. Lives in its own key space
/// (see [`EntryKey`]) so it can never collide with a server identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub u64);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// Identity of an entry in the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// Server-confirmed message.
    Confirmed(MessageId),
    /// Provisional message awaiting the server.
    Pending(TempId),
}

/// One row of the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// Entry identity.
    pub key: EntryKey,
    /// Owning room.
    pub room_id: RoomId,
    /// Body text.
    pub body: String,
    /// Author.
    pub author: ChatUser,
    /// Server timestamp. `None` for provisional entries.
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatEntry {
    /// Entry for a server-confirmed message.
    pub fn confirmed(message: Message) -> Self {
        Self {
            key: EntryKey::Confirmed(message.id),
            room_id: message.room_id,
            body: message.body,
            author: message.user,
            created_at: message.created_at,
        }
    }

    /// Provisional entry shown while a send is in flight.
    pub fn provisional(temp_id: TempId, room_id: RoomId, body: String, author: ChatUser) -> Self {
        Self { key: EntryKey::Pending(temp_id), room_id, body, author, created_at: None }
    }

    /// Entry is awaiting server confirmation.
    pub fn is_pending(&self) -> bool {
        matches!(self.key, EntryKey::Pending(_))
    }

    /// Entry was written by the local user.
    ///
    /// Provisional entries are always local. Confirmed entries match on the
    /// signed-in user's id.
    pub fn is_mine(&self, me: Option<UserId>) -> bool {
        self.is_pending() || me.is_some_and(|id| id == self.author.id)
    }
}

/// Author descriptor for the local user when no identity is known.
pub fn placeholder_author() -> ChatUser {
    ChatUser::new(0, PLACEHOLDER_AUTHOR_NAME)
}

/// Room directory state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DirectoryState {
    /// Not fetched yet.
    #[default]
    Unloaded,
    /// Fetch in flight. Keeps showing the previous snapshot until the new
    /// one lands.
    Loading(Vec<Room>),
    /// Last fetched snapshot.
    Loaded(Vec<Room>),
    /// Last fetch failed. Presented as an empty directory.
    Failed,
}

impl DirectoryState {
    /// Rooms in the current snapshot.
    pub fn rooms(&self) -> &[Room] {
        match self {
            Self::Loaded(rooms) | Self::Loading(rooms) => rooms,
            Self::Unloaded | Self::Failed => &[],
        }
    }

    /// Start a fetch, keeping the rooms currently shown.
    #[must_use]
    pub fn reloading(self) -> Self {
        match self {
            Self::Loaded(rooms) | Self::Loading(rooms) => Self::Loading(rooms),
            Self::Unloaded | Self::Failed => Self::Loading(Vec::new()),
        }
    }

    /// A snapshot (possibly empty) is available to resolve selections.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed)
    }
}

/// Key for a room activation.
///
/// Each activation gets a fresh generation. Results are applied only while
/// their ticket is still the current one; anything else is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    /// Room being loaded.
    pub room_id: RoomId,
    /// Activation counter at request time.
    pub generation: u64,
}

/// Lifecycle of the active room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomPhase {
    /// No active room.
    #[default]
    Idle,
    /// Join and history fetch in flight.
    Loading(LoadTicket),
    /// History loaded.
    Ready(LoadTicket),
    /// Join or history fetch failed. Re-selecting the room retries.
    Failed(LoadTicket),
}

impl RoomPhase {
    /// Ticket of the current activation. `None` when idle.
    pub fn ticket(&self) -> Option<LoadTicket> {
        match self {
            Self::Idle => None,
            Self::Loading(t) | Self::Ready(t) | Self::Failed(t) => Some(*t),
        }
    }
}
