//! Backend contract consumed by the chat core.
//!
//! The [`ChatApi`] trait decouples the session from a specific transport.
//! Production uses the HTTP client in `huddle-client`; tests use the scripted
//! backend in `huddle-harness`. Both run under the same generic runtime.

use std::future::Future;

use crate::{ChatError, Message, Room, RoomId};

/// Number of messages the backend returns for a history fetch.
///
/// Server-determined; surfaced to users as "last 50".
pub const HISTORY_LIMIT: usize = 50;

/// The four backend operations the chat core depends on.
///
/// # Invariants
///
/// - `join_room` is idempotent: joining an already-joined room succeeds.
/// - `fetch_history` returns at most [`HISTORY_LIMIT`] messages, oldest first.
/// - `send_message` returns either a complete [`Message`] or an error, never a
///   partial object.
pub trait ChatApi: Send + Sync + 'static {
    /// List rooms, optionally filtered by domain key.
    fn list_rooms(
        &self,
        domain: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Room>, ChatError>> + Send;

    /// Join a room. Succeeds silently if already joined.
    fn join_room(&self, room_id: RoomId) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Fetch the most recent messages of a room, oldest first.
    fn fetch_history(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Message>, ChatError>> + Send;

    /// Post a message and return the server-confirmed copy.
    fn send_message(
        &self,
        room_id: RoomId,
        body: &str,
    ) -> impl Future<Output = Result<Message, ChatError>> + Send;
}
