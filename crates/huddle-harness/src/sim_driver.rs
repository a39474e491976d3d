//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` replays a script of user steps against the same
//! [`huddle_app::Runtime`] orchestration code that drives the CLI. It models
//! the message list viewport so scroll anchoring can be asserted in pixels,
//! and records every rendered frame for inspection through a [`SimView`].

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use huddle_app::{ChatEvent, ChatSession, Driver, Interaction, ScrollMetrics};
use huddle_core::RoomId;
use tokio::time::Instant;

use crate::invariants::{InvariantRegistry, SessionSnapshot, Violation};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One scripted user step.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver an event to the session.
    Event(ChatEvent),
    /// Let simulated time pass before the next step.
    Wait(Duration),
    /// User scrolls the message list to an offset (counts as an interaction).
    ScrollTo(f64),
    /// User closes the view.
    Close,
}

/// Message list viewport with fixed-height rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimViewport {
    client_height: f64,
    row_height: f64,
    content_height: f64,
    scroll_top: f64,
}

impl Default for SimViewport {
    fn default() -> Self {
        Self::new(400.0, 40.0)
    }
}

impl SimViewport {
    /// Viewport of `client_height` pixels showing rows of `row_height`.
    pub fn new(client_height: f64, row_height: f64) -> Self {
        Self { client_height, row_height, content_height: 0.0, scroll_top: 0.0 }
    }

    /// Current metrics.
    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_height: self.content_height.max(self.client_height),
            scroll_top: self.scroll_top,
            client_height: self.client_height,
        }
    }

    /// Lay out `rows` rows. The scroll offset is kept unless the content
    /// shrank below it.
    pub fn layout(&mut self, rows: usize) {
        self.content_height = rows as f64 * self.row_height;
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }

    /// Scroll to an offset, clamped to the content.
    pub fn scroll_to(&mut self, top: f64) {
        self.scroll_top = top.clamp(0.0, self.max_scroll_top());
    }

    /// Scroll to the newest row.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll_top();
    }

    /// Scroll offset.
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Newest row is fully visible.
    pub fn is_at_bottom(&self) -> bool {
        self.metrics().distance_from_bottom() <= 0.0
    }

    fn max_scroll_top(&self) -> f64 {
        (self.content_height - self.client_height).max(0.0)
    }
}

/// Everything the driver observed, shared with the test.
#[derive(Default)]
struct ViewState {
    viewport: SimViewport,
    frames: Vec<SessionSnapshot>,
    scrolls: usize,
    navigations: Vec<RoomId>,
    violations: Vec<Violation>,
    stopped: bool,
}

/// Read-only handle on what a [`SimDriver`] rendered.
#[derive(Clone)]
pub struct SimView {
    state: Arc<Mutex<ViewState>>,
}

impl SimView {
    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last rendered frame.
    pub fn last_frame(&self) -> Option<SessionSnapshot> {
        self.state().frames.last().cloned()
    }

    /// Every rendered frame, oldest first.
    pub fn frames(&self) -> Vec<SessionSnapshot> {
        self.state().frames.clone()
    }

    /// Current viewport.
    pub fn viewport(&self) -> SimViewport {
        self.state().viewport
    }

    /// Number of scroll-to-bottom requests.
    pub fn scroll_count(&self) -> usize {
        self.state().scrolls
    }

    /// Rooms navigated to, in order.
    pub fn navigations(&self) -> Vec<RoomId> {
        self.state().navigations.clone()
    }

    /// Invariant violations seen on any rendered frame.
    pub fn violations(&self) -> Vec<Violation> {
        self.state().violations.clone()
    }

    /// Driver was stopped by the runtime.
    pub fn is_stopped(&self) -> bool {
        self.state().stopped
    }
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the same [`huddle_app::Runtime`] orchestration
/// code runs in both the CLI and simulation tests. The view closes once the
/// script is exhausted.
pub struct SimDriver {
    script: VecDeque<Step>,
    /// End of the current wait step. Kept across cancelled polls.
    deadline: Option<Instant>,
    state: Arc<Mutex<ViewState>>,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver replaying `script`.
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            deadline: None,
            state: Arc::new(Mutex::new(ViewState::default())),
            invariants: None,
        }
    }

    /// Use a specific viewport geometry.
    #[must_use]
    pub fn with_viewport(self, viewport: SimViewport) -> Self {
        self.state().viewport = viewport;
        self
    }

    /// Check invariants on every rendered frame.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Handle for inspecting what was rendered.
    pub fn view(&self) -> SimView {
        SimView { state: Arc::clone(&self.state) }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<ChatEvent>, Self::Error> {
        loop {
            if let Some(deadline) = self.deadline {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }

            match self.script.pop_front() {
                Some(Step::Event(event)) => return Ok(Some(event)),
                Some(Step::Wait(duration)) => self.deadline = Some(Instant::now() + duration),
                Some(Step::ScrollTo(top)) => {
                    self.state().viewport.scroll_to(top);
                    return Ok(Some(ChatEvent::Interaction(Interaction::Scroll)));
                },
                Some(Step::Close) | None => return Ok(None),
            }
        }
    }

    fn viewport(&self) -> Option<ScrollMetrics> {
        Some(self.state().viewport.metrics())
    }

    fn render(&mut self, session: &ChatSession) -> Result<(), Self::Error> {
        let snapshot = SessionSnapshot::from_session(session);
        let violations = self
            .invariants
            .as_ref()
            .and_then(|registry| registry.check_all(&snapshot).err())
            .unwrap_or_default();

        let mut state = self.state();
        state.viewport.layout(snapshot.entries.len());
        state.violations.extend(violations);
        state.frames.push(snapshot);
        Ok(())
    }

    fn scroll_to_bottom(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.viewport.scroll_to_bottom();
        state.scrolls += 1;
        Ok(())
    }

    fn navigate(&mut self, room_id: RoomId) {
        self.state().navigations.push(room_id);
    }

    fn stop(&mut self) {
        self.state().stopped = true;
    }
}
