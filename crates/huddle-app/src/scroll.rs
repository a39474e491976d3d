//! Scroll anchor policy.
//!
//! Decides whether the message list should be forced to its newest entry
//! after a mutation. The decision is always made from metrics captured
//! before the mutation, since appending content changes `scroll_height`.

/// Distance from the bottom (px) that still counts as "at the bottom".
pub const NEAR_BOTTOM_THRESHOLD_PX: f64 = 80.0;

/// Viewport metrics of the message list container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Total content height.
    pub scroll_height: f64,
    /// Offset of the visible region from the top.
    pub scroll_top: f64,
    /// Visible height.
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Remaining scrollable distance below the visible region.
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    /// Metrics after scrolling to the newest entry.
    #[must_use]
    pub fn scrolled_to_bottom(self) -> Self {
        let scroll_top = (self.scroll_height - self.client_height).max(0.0);
        Self { scroll_top, ..self }
    }
}

/// Near-bottom test with a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    threshold: f64,
}

impl ScrollAnchor {
    /// Create a policy with the given threshold in pixels.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Threshold in pixels.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Viewport is at or near the newest entry.
    ///
    /// No viewport (nothing rendered yet, or a frontend without one) counts
    /// as near the bottom.
    pub fn is_near_bottom(&self, metrics: Option<ScrollMetrics>) -> bool {
        metrics.is_none_or(|m| m.distance_from_bottom() <= self.threshold)
    }
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new(NEAR_BOTTOM_THRESHOLD_PX)
    }
}
