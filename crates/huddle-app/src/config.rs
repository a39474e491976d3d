//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{rotator::ROTATION_INTERVAL_MS, scroll::NEAR_BOTTOM_THRESHOLD_PX};

/// Which surface hosts the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionVariant {
    /// Embedded widget: defaults to the first room and rotates the highlight
    /// until the user interacts.
    #[default]
    Embedded,
    /// Full chat page: the active room follows the route parameter.
    FullPage,
}

/// Behavioral knobs of a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Hosting surface.
    pub variant: SessionVariant,
    /// Domain filter passed to the room directory. `None` lists all rooms.
    pub domain: Option<String>,
    /// Near-bottom threshold in pixels.
    pub near_bottom_threshold_px: f64,
    /// Highlight rotation interval in milliseconds.
    pub rotation_interval_ms: u64,
    /// History refresh interval in milliseconds. `None` disables polling.
    pub poll_interval_ms: Option<u64>,
    /// Put the body of a failed send back into an empty draft.
    pub restore_failed_input: bool,
}

impl ChatConfig {
    /// Default configuration for a surface.
    pub fn for_variant(variant: SessionVariant) -> Self {
        Self { variant, ..Self::default() }
    }

    /// Highlight rotation interval.
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    /// History refresh interval, if polling is enabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            variant: SessionVariant::default(),
            domain: None,
            near_bottom_threshold_px: NEAR_BOTTOM_THRESHOLD_PX,
            rotation_interval_ms: ROTATION_INTERVAL_MS,
            poll_interval_ms: None,
            restore_failed_input: false,
        }
    }
}
