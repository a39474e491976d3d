//! Room activity rotator for the embedded widget.
//!
//! Cycles the highlighted room on a fixed interval until the user touches the
//! widget. Highlighting never changes the active room.

use std::time::Duration;

/// Default interval between highlight advances.
pub const ROTATION_INTERVAL: Duration = Duration::from_millis(ROTATION_INTERVAL_MS);

/// [`ROTATION_INTERVAL`] in milliseconds.
pub const ROTATION_INTERVAL_MS: u64 = 2500;

/// User interaction that stops rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Pointer pressed anywhere in the widget.
    PointerDown,
    /// Touch started anywhere in the widget.
    TouchStart,
    /// Focus moved into the widget.
    Focus,
    /// Message list scrolled by the user.
    Scroll,
}

/// One-way latch, false to true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionLatch {
    set: bool,
}

impl InteractionLatch {
    /// Latch has been set.
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Set the latch. Returns true only on the first call.
    pub fn set(&mut self) -> bool {
        !std::mem::replace(&mut self.set, true)
    }
}

/// Highlight cursor plus timer ownership flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomRotator {
    highlighted: usize,
    running: bool,
}

impl RoomRotator {
    /// Index of the highlighted room.
    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Rotation timer is (or should be) running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start rotating. Returns true if the timer must be started.
    ///
    /// Refuses once the latch is set or when there is nothing to rotate.
    pub fn start(&mut self, room_count: usize, latch: InteractionLatch) -> bool {
        if self.running || latch.is_set() || room_count == 0 {
            return false;
        }
        self.running = true;
        true
    }

    /// Stop rotating. Returns true if the timer must be torn down.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Advance the highlight by one, wrapping. Returns true if it moved.
    pub fn tick(&mut self, room_count: usize) -> bool {
        if !self.running || room_count == 0 {
            return false;
        }
        self.highlighted = (self.highlighted + 1) % room_count;
        true
    }

    /// Move the highlight to a specific room.
    pub fn highlight(&mut self, index: usize) {
        self.highlighted = index;
    }

    /// Clamp the highlight into a (possibly shrunk) directory.
    pub fn clamp(&mut self, room_count: usize) {
        if self.highlighted >= room_count {
            self.highlighted = 0;
        }
    }
}
