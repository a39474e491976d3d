//! Application layer for Huddle
//!
//! Pure state machines and a generic runtime for the chat session core,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`ChatSession`]: session state machine (room selection, message list,
//!   optimistic sends, scroll anchoring, highlight rotation)
//! - [`Driver`]: Trait for platform-specific view abstraction
//! - [`Runtime`]: Generic orchestration loop over a [`Driver`] and a
//!   [`huddle_core::ChatApi`]
//! - [`reconcile`]: pure fold of a send outcome into the message list

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod controller;
mod driver;
mod event;
mod pending;
mod repeating;
mod rotator;
mod runtime;
mod scroll;
mod state;
pub mod synchronizer;

pub use action::ChatAction;
pub use config::{ChatConfig, SessionVariant};
pub use controller::ChatSession;
pub use driver::Driver;
pub use event::ChatEvent;
pub use pending::{PendingSend, SendState, reconcile};
pub use repeating::Repeating;
pub use rotator::{Interaction, InteractionLatch, ROTATION_INTERVAL, ROTATION_INTERVAL_MS, RoomRotator};
pub use runtime::Runtime;
pub use scroll::{NEAR_BOTTOM_THRESHOLD_PX, ScrollAnchor, ScrollMetrics};
pub use state::{
    ChatEntry, DirectoryState, EntryKey, LoadTicket, PLACEHOLDER_AUTHOR_NAME, RoomPhase, TempId,
    placeholder_author,
};
