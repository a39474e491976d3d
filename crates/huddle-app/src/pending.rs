//! Optimistic send pipeline.
//!
//! A send is a small state machine: `Pending -> Confirmed | Failed`. The
//! provisional entry is appended synchronously when the user submits; the
//! network outcome is folded back into the list by [`reconcile`], a pure
//! function from (entries, outcome) to entries.
//!
//! # Invariants
//!
//! - A provisional entry is either replaced in place or removed, never both.
//! - Reconciliation never reorders entries and never appends.
//! - Reconciling an outcome whose temporary id is absent is a no-op.

use huddle_core::{ChatError, Message, RoomId};

use crate::state::{ChatEntry, EntryKey, TempId};

/// Delivery state of one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendState {
    /// Network call in flight.
    Pending {
        /// Temporary id of the provisional entry.
        temp_id: TempId,
    },
    /// Server accepted the message.
    Confirmed {
        /// Temporary id of the provisional entry.
        temp_id: TempId,
        /// Server-confirmed copy.
        message: Message,
    },
    /// Network call failed.
    Failed {
        /// Temporary id of the provisional entry.
        temp_id: TempId,
    },
}

impl SendState {
    /// Temporary id this state refers to.
    pub fn temp_id(&self) -> TempId {
        match self {
            Self::Pending { temp_id }
            | Self::Confirmed { temp_id, .. }
            | Self::Failed { temp_id } => *temp_id,
        }
    }
}

/// A send awaiting its network outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    /// Room the message was sent to.
    pub room_id: RoomId,
    /// Trimmed body as submitted.
    pub body: String,
    /// Current delivery state.
    pub state: SendState,
}

impl PendingSend {
    /// Track a newly submitted message.
    pub fn new(temp_id: TempId, room_id: RoomId, body: String) -> Self {
        Self { room_id, body, state: SendState::Pending { temp_id } }
    }

    /// Temporary id of the provisional entry.
    pub fn temp_id(&self) -> TempId {
        self.state.temp_id()
    }

    /// Fold the network result into a terminal state.
    pub fn resolve(self, result: Result<Message, ChatError>) -> SendState {
        let temp_id = self.temp_id();
        match result {
            Ok(message) => SendState::Confirmed { temp_id, message },
            Err(_) => SendState::Failed { temp_id },
        }
    }
}

/// Apply a send outcome to the message list.
///
/// `Confirmed` replaces the provisional entry in place with the server copy.
/// If the server copy is already present (a history refresh delivered it
/// first) the provisional entry is dropped instead, so the message is never
/// shown twice. `Failed` removes the provisional entry. `Pending` is a no-op.
pub fn reconcile(mut entries: Vec<ChatEntry>, outcome: &SendState) -> Vec<ChatEntry> {
    let pending_key = EntryKey::Pending(outcome.temp_id());
    let Some(index) = entries.iter().position(|e| e.key == pending_key) else {
        return entries;
    };

    match outcome {
        SendState::Pending { .. } => {},
        SendState::Confirmed { message, .. } => {
            let confirmed_key = EntryKey::Confirmed(message.id);
            if entries.iter().any(|e| e.key == confirmed_key) {
                entries.remove(index);
            } else {
                entries[index] = ChatEntry::confirmed(message.clone());
            }
        },
        SendState::Failed { .. } => {
            entries.remove(index);
        },
    }

    entries
}

#[cfg(test)]
mod tests {
    use huddle_core::{ChatUser, MessageId};

    use super::*;
    use crate::state::placeholder_author;

    fn confirmed(id: u64, body: &str) -> ChatEntry {
        ChatEntry::confirmed(Message::new(id, 1, body, ChatUser::new(5, "Alice")))
    }

    fn provisional(temp: u64, body: &str) -> ChatEntry {
        ChatEntry::provisional(TempId(temp), RoomId(1), body.into(), placeholder_author())
    }

    #[test]
    fn confirmed_replaces_in_place() {
        let entries = vec![confirmed(1, "a"), provisional(10, "mine"), confirmed(2, "b")];
        let message = Message::new(3, 1, "mine", ChatUser::new(9, "Me"));

        let entries = reconcile(entries, &SendState::Confirmed { temp_id: TempId(10), message });

        let keys: Vec<_> = entries.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![
            EntryKey::Confirmed(MessageId(1)),
            EntryKey::Confirmed(MessageId(3)),
            EntryKey::Confirmed(MessageId(2)),
        ]);
    }

    #[test]
    fn failed_removes_only_the_provisional_entry() {
        let before = vec![confirmed(1, "a"), confirmed(2, "b")];
        let mut entries = before.clone();
        entries.push(provisional(10, "mine"));

        let entries = reconcile(entries, &SendState::Failed { temp_id: TempId(10) });

        assert_eq!(entries, before);
    }

    #[test]
    fn confirmed_duplicate_drops_provisional() {
        let entries = vec![confirmed(3, "mine"), provisional(10, "mine")];
        let message = Message::new(3, 1, "mine", ChatUser::new(9, "Me"));

        let entries = reconcile(entries, &SendState::Confirmed { temp_id: TempId(10), message });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, EntryKey::Confirmed(MessageId(3)));
    }

    #[test]
    fn unknown_temp_id_is_noop() {
        let before = vec![confirmed(1, "a"), provisional(10, "mine")];
        let entries = reconcile(before.clone(), &SendState::Failed { temp_id: TempId(11) });
        assert_eq!(entries, before);
    }

    #[test]
    fn pending_outcome_is_noop() {
        let before = vec![provisional(10, "mine")];
        let entries = reconcile(before.clone(), &SendState::Pending { temp_id: TempId(10) });
        assert_eq!(entries, before);
    }

    #[test]
    fn resolve_maps_result() {
        let send = PendingSend::new(TempId(4), RoomId(1), "x".into());
        let state = send.clone().resolve(Err(ChatError::Timeout));
        assert_eq!(state, SendState::Failed { temp_id: TempId(4) });

        let message = Message::new(8, 1, "x", ChatUser::new(1, "Me"));
        let state = send.resolve(Ok(message.clone()));
        assert_eq!(state, SendState::Confirmed { temp_id: TempId(4), message });
    }
}
