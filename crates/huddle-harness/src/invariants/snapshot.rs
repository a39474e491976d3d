//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use huddle_app::{ChatSession, EntryKey, RoomPhase, TempId};
use huddle_core::RoomId;

/// Snapshot of a single session's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Room ids in directory order.
    pub rooms: Vec<RoomId>,
    /// Currently active room.
    pub active_room: Option<RoomId>,
    /// Lifecycle of the active room.
    pub phase: RoomPhase,
    /// Rendered entries, oldest first.
    pub entries: Vec<EntrySnapshot>,
    /// Temporary ids of sends awaiting an outcome.
    pub in_flight: Vec<TempId>,
    /// Highlighted directory index.
    pub highlighted: usize,
    /// Highlight rotation is running.
    pub rotating: bool,
    /// User has interacted with the widget.
    pub interacted: bool,
}

/// Snapshot of one rendered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    /// Entry key.
    pub key: EntryKey,
    /// Room the entry belongs to.
    pub room_id: RoomId,
    /// Message body.
    pub body: String,
    /// Author display name.
    pub author: String,
}

impl SessionSnapshot {
    /// Capture the observable state of `session`.
    pub fn from_session(session: &ChatSession) -> Self {
        Self {
            rooms: session.rooms().iter().map(|r| r.id).collect(),
            active_room: session.active_room(),
            phase: session.phase(),
            entries: session
                .entries()
                .iter()
                .map(|e| EntrySnapshot {
                    key: e.key,
                    room_id: e.room_id,
                    body: e.body.clone(),
                    author: e.author.name.clone(),
                })
                .collect(),
            in_flight: session.in_flight().iter().map(|p| p.temp_id()).collect(),
            highlighted: session.highlighted_index(),
            rotating: session.is_rotating(),
            interacted: session.has_interacted(),
        }
    }

    /// Bodies of the rendered entries.
    pub fn bodies(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.body.as_str()).collect()
    }

    /// Highlighted room id, if the directory is not empty.
    pub fn highlighted_room(&self) -> Option<RoomId> {
        self.rooms.get(self.highlighted).copied()
    }
}
