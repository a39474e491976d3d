//! Message synchronizer.
//!
//! Joins a room, then fetches its history. The two calls are sequential: the
//! history fetch only runs once the join has resolved, and a failed join
//! yields no partial load. No caching across rooms.

use huddle_core::{ChatApi, ChatError, Message, RoomId};

/// Join `room_id` and fetch its most recent messages, oldest first.
pub async fn synchronize<A: ChatApi>(api: &A, room_id: RoomId) -> Result<Vec<Message>, ChatError> {
    api.join_room(room_id).await?;
    let messages = api.fetch_history(room_id).await?;
    tracing::debug!(%room_id, count = messages.len(), "history fetched");
    Ok(messages)
}

/// Refetch history of an already joined room.
pub async fn refresh<A: ChatApi>(api: &A, room_id: RoomId) -> Result<Vec<Message>, ChatError> {
    api.fetch_history(room_id).await
}
