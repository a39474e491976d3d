//! Core types for the Huddle chat session.
//!
//! Shared vocabulary between the sans-IO session state machines in
//! `huddle-app` and the concrete backends: the wire data model, the
//! [`ChatApi`] contract every backend implements, and the injectable
//! [`SessionStore`] that replaces ad-hoc global credential storage.
//!
//! # Components
//!
//! - [`Room`], [`Message`], [`ChatUser`]: snapshots as served by the backend
//! - [`ChatApi`]: the four backend operations the chat core consumes
//! - [`SessionStore`]: credential access plus change notification
//! - [`ChatError`]: request failures, always converted to local state

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod error;
pub mod session;
pub mod types;

pub use api::{ChatApi, HISTORY_LIMIT};
pub use error::ChatError;
pub use session::{Credential, MemorySession, Role, SessionStore, SessionUser};
pub use types::{ChatUser, Message, MessageId, Room, RoomId, UserId};
