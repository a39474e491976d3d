//! Deterministic simulation harness for Huddle chat testing.
//!
//! In-memory implementations of the [`huddle_core::ChatApi`] and
//! [`huddle_app::Driver`] traits for deterministic, reproducible testing
//! under tokio's paused clock.
//!
//! # Backend
//!
//! [`SimApi`] keeps rooms, memberships and histories in memory. Every call
//! sleeps for a configurable latency before completing, so races between
//! room switches and sends can be scripted exactly.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_api;
pub mod sim_driver;

pub use invariants::{
    ActiveRoomInDirectory, EntriesMatchActiveRoom, EntrySnapshot, HighlightInRange, Invariant,
    InvariantRegistry, InvariantResult, LoadingRoomIsEmpty, PendingEntriesTracked,
    RotationStopsOnInteraction, SessionSnapshot, UniqueEntryKeys, Violation,
};
pub use sim_api::{Endpoint, SimApi};
pub use sim_driver::{SimDriver, SimDriverError, SimView, SimViewport, Step};
