//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use huddle_app::{EntryKey, RoomPhase};

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// Active room must exist in the directory.
///
/// If `active_room` is `Some(room_id)`, the directory snapshot must contain
/// `room_id`. This prevents the UI from showing a room that doesn't exist.
pub struct ActiveRoomInDirectory;

impl Invariant for ActiveRoomInDirectory {
    fn name(&self) -> &'static str {
        "ActiveRoomInDirectory"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if let Some(active) = state.active_room
            && !state.rooms.contains(&active)
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!("active room {active} not in directory {:?}", state.rooms),
            });
        }
        Ok(())
    }
}

/// Every rendered entry belongs to the active room.
///
/// A mix of rooms in one list means a stale load or send outcome leaked
/// past its ticket.
pub struct EntriesMatchActiveRoom;

impl Invariant for EntriesMatchActiveRoom {
    fn name(&self) -> &'static str {
        "EntriesMatchActiveRoom"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for entry in &state.entries {
            if Some(entry.room_id) != state.active_room {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "entry {:?} of room {} rendered while active room is {:?}",
                        entry.key, entry.room_id, state.active_room
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No two entries share a key.
///
/// A confirmed send must replace its provisional entry, never duplicate it.
pub struct UniqueEntryKeys;

impl Invariant for UniqueEntryKeys {
    fn name(&self) -> &'static str {
        "UniqueEntryKeys"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for entry in &state.entries {
            if !seen.insert(entry.key) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("duplicate entry {:?}", entry.key),
                });
            }
        }
        Ok(())
    }
}

/// Every provisional entry has a send in flight.
///
/// An orphaned provisional entry would never be reconciled.
pub struct PendingEntriesTracked;

impl Invariant for PendingEntriesTracked {
    fn name(&self) -> &'static str {
        "PendingEntriesTracked"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for entry in &state.entries {
            if let EntryKey::Pending(temp_id) = entry.key
                && !state.in_flight.contains(&temp_id)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("provisional entry {temp_id} has no send in flight"),
                });
            }
        }
        Ok(())
    }
}

/// A room that is still loading shows no entries.
pub struct LoadingRoomIsEmpty;

impl Invariant for LoadingRoomIsEmpty {
    fn name(&self) -> &'static str {
        "LoadingRoomIsEmpty"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let loading = matches!(state.phase, RoomPhase::Idle | RoomPhase::Loading(_));
        if loading && !state.entries.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} entries rendered in phase {:?}",
                    state.entries.len(),
                    state.phase
                ),
            });
        }
        Ok(())
    }
}

/// Highlight index points into the directory.
pub struct HighlightInRange;

impl Invariant for HighlightInRange {
    fn name(&self) -> &'static str {
        "HighlightInRange"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let in_range = if state.rooms.is_empty() {
            state.highlighted == 0
        } else {
            state.highlighted < state.rooms.len()
        };
        if !in_range {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "highlight {} out of range for {} rooms",
                    state.highlighted,
                    state.rooms.len()
                ),
            });
        }
        Ok(())
    }
}

/// Rotation never runs once the user has interacted.
pub struct RotationStopsOnInteraction;

impl Invariant for RotationStopsOnInteraction {
    fn name(&self) -> &'static str {
        "RotationStopsOnInteraction"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.interacted && state.rotating {
            return Err(Violation {
                invariant: self.name(),
                message: "rotation running after user interaction".to_string(),
            });
        }
        Ok(())
    }
}
