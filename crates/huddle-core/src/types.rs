//! Wire data model.
//!
//! These are read-only snapshots of server state. The client never mutates a
//! [`Room`] in place; the full set is replaced by a fresh directory fetch.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Server-assigned room identifier.
    RoomId
);
id_type!(
    /// Server-assigned message identifier.
    MessageId
);
id_type!(
    /// Server-assigned user identifier.
    UserId
);

/// A chat room as listed by the room directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Domain classification key (used by the directory filter).
    #[serde(default)]
    pub domain_key: String,
}

impl Room {
    /// Create a room snapshot.
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), domain_key: String::new() }
    }

    /// Set the domain classification key.
    #[must_use]
    pub fn with_domain(mut self, domain_key: impl Into<String>) -> Self {
        self.domain_key = domain_key.into();
        self
    }
}

/// Message author descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ChatUser {
    /// Create an author descriptor without avatar.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), avatar: None }
    }
}

/// A server-confirmed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identifier.
    pub id: MessageId,
    /// Owning room.
    pub room_id: RoomId,
    /// Body text.
    pub body: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Author.
    pub user: ChatUser,
}

impl Message {
    /// Create a message without timestamp.
    pub fn new(
        id: impl Into<MessageId>,
        room_id: impl Into<RoomId>,
        body: impl Into<String>,
        user: ChatUser,
    ) -> Self {
        Self { id: id.into(), room_id: room_id.into(), body: body.into(), created_at: None, user }
    }
}
