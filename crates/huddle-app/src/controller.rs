//! Chat session state machine.
//!
//! This module defines [`ChatSession`], the composition root of the chat core.
//! It owns the active room and orchestrates the room directory, message
//! synchronization, optimistic sends, scroll anchoring and highlight rotation,
//! completely decoupled from I/O.
//!
//! This is a pure state machine: it consumes [`crate::ChatEvent`] inputs and
//! produces [`crate::ChatAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Resolves the requested room (explicit click, route parameter or default)
//!   against the latest directory snapshot.
//! - Keys every room activation with a [`LoadTicket`] and discards results
//!   whose ticket is no longer current.
//! - Appends provisional entries on send and reconciles them with the network
//!   outcome.
//! - Decides scroll anchoring from the viewport observed before each mutation.

use huddle_core::{ChatError, ChatUser, Message, Room, RoomId};

use crate::{
    ChatAction, ChatConfig, ChatEvent, Interaction, SessionVariant,
    pending::{PendingSend, SendState, reconcile},
    rotator::{InteractionLatch, RoomRotator},
    scroll::{ScrollAnchor, ScrollMetrics},
    state::{
        ChatEntry, DirectoryState, EntryKey, LoadTicket, RoomPhase, TempId, placeholder_author,
    },
};

/// Chat session state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    config: ChatConfig,
    /// Last directory snapshot.
    directory: DirectoryState,
    /// Room the user or route asked for. Survives directory refreshes.
    requested: Option<RoomId>,
    /// Currently active room. `None` if nothing is selectable.
    active: Option<RoomId>,
    /// Lifecycle of the active room.
    phase: RoomPhase,
    /// Activation counter backing [`LoadTicket`].
    generation: u64,
    /// Message list of the active room, oldest first.
    entries: Vec<ChatEntry>,
    /// Sends awaiting their network outcome.
    in_flight: Vec<PendingSend>,
    /// Next temporary id.
    next_temp: u64,
    anchor: ScrollAnchor,
    /// Viewport observed before the mutation being processed.
    viewport: Option<ScrollMetrics>,
    /// Scroll to bottom once the loading room renders.
    scroll_on_load: bool,
    latch: InteractionLatch,
    rotator: RoomRotator,
    polling: bool,
    /// Refresh requests issued so far.
    refreshes: u64,
    /// Sequence number of the newest refresh applied.
    applied_refresh: Option<u64>,
    /// Locally confirmed sends, tagged with the refresh count at
    /// confirmation. A snapshot requested before that point predates them.
    confirmed_sends: Vec<(u64, ChatEntry)>,
    /// Local author. `None` if signed out or unknown.
    identity: Option<ChatUser>,
    /// Composer contents.
    draft: String,
}

impl ChatSession {
    /// Create an unmounted session.
    pub fn new(config: ChatConfig) -> Self {
        let anchor = ScrollAnchor::new(config.near_bottom_threshold_px);
        Self {
            config,
            directory: DirectoryState::Unloaded,
            requested: None,
            active: None,
            phase: RoomPhase::Idle,
            generation: 0,
            entries: Vec::new(),
            in_flight: Vec::new(),
            next_temp: 1,
            anchor,
            viewport: None,
            scroll_on_load: true,
            latch: InteractionLatch::default(),
            rotator: RoomRotator::default(),
            polling: false,
            refreshes: 0,
            applied_refresh: None,
            confirmed_sends: Vec::new(),
            identity: None,
            draft: String::new(),
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ChatEvent) -> Vec<ChatAction> {
        match event {
            ChatEvent::SelectRoom(room_id) => self.select_room(room_id),
            ChatEvent::HoverRoom(room_id) => self.hover_room(room_id),
            ChatEvent::RouteChanged(route) => self.route_changed(route),
            ChatEvent::Interaction(kind) => self.interact(kind),
            ChatEvent::DraftChanged(text) => {
                self.draft = text;
                vec![ChatAction::Render]
            },
            ChatEvent::Submit => self.submit(),
            ChatEvent::ReloadDirectory => self.reload_directory(),
            ChatEvent::DirectoryLoaded(result) => self.on_directory(result),
            ChatEvent::RoomLoaded { ticket, result } => self.on_room_loaded(ticket, result),
            ChatEvent::RoomRefreshed { ticket, seq, result } => {
                self.on_room_refreshed(ticket, seq, result)
            },
            ChatEvent::MessageSent { room_id, temp_id, result } => {
                self.on_message_sent(room_id, temp_id, result)
            },
            ChatEvent::RotationTick => {
                if self.rotator.tick(self.directory.rooms().len()) {
                    vec![ChatAction::Render]
                } else {
                    vec![]
                }
            },
            ChatEvent::PollTick => match self.phase {
                RoomPhase::Ready(ticket) => {
                    let seq = self.refreshes;
                    self.refreshes += 1;
                    vec![ChatAction::RefreshRoom { ticket, seq }]
                },
                RoomPhase::Idle | RoomPhase::Loading(_) | RoomPhase::Failed(_) => vec![],
            },
        }
    }

    /// Start the session: fetch the directory and start polling if enabled.
    pub fn mount(&mut self) -> Vec<ChatAction> {
        let mut actions = self.reload_directory();
        if let Some(interval) = self.config.poll_interval()
            && !self.polling
        {
            self.polling = true;
            actions.push(ChatAction::StartPolling { interval });
        }
        actions
    }

    /// Tear the session down: stop every timer and drop in-memory messages.
    pub fn unmount(&mut self) -> Vec<ChatAction> {
        let mut actions = Vec::new();
        if self.rotator.stop() {
            actions.push(ChatAction::StopRotation);
        }
        if std::mem::replace(&mut self.polling, false) {
            actions.push(ChatAction::StopPolling);
        }
        self.deactivate();
        self.in_flight.clear();
        actions
    }

    /// Refetch the room directory.
    pub fn reload_directory(&mut self) -> Vec<ChatAction> {
        self.directory = std::mem::take(&mut self.directory).reloading();
        vec![ChatAction::FetchRooms { domain: self.config.domain.clone() }, ChatAction::Render]
    }

    /// User clicked a room.
    ///
    /// Counts as an interaction. Switching rooms emits a navigation so the
    /// route follows the selection.
    pub fn select_room(&mut self, room_id: RoomId) -> Vec<ChatAction> {
        let mut actions = self.latch_interaction();
        self.highlight_room(room_id);
        let switch = self.request_room(room_id);
        if switch.iter().any(|a| matches!(a, ChatAction::LoadRoom { .. })) {
            actions.push(ChatAction::Navigate { room_id });
        }
        actions.extend(switch);
        if !actions.contains(&ChatAction::Render) {
            actions.push(ChatAction::Render);
        }
        actions
    }

    /// Send a message to the active room.
    ///
    /// No-op for a blank body, without an active room, or while the active
    /// room's history is still loading. A room that failed to load accepts
    /// sends. The provisional entry is appended before the request is issued.
    pub fn send(&mut self, body: &str) -> Vec<ChatAction> {
        let body = body.trim();
        let (RoomPhase::Ready(ticket) | RoomPhase::Failed(ticket)) = self.phase else {
            return vec![];
        };
        if body.is_empty() {
            return vec![];
        }

        let mut actions = self.latch_interaction();
        let temp_id = TempId(self.next_temp);
        self.next_temp += 1;

        let author = self.identity.clone().unwrap_or_else(placeholder_author);
        self.entries.push(ChatEntry::provisional(temp_id, ticket.room_id, body.to_owned(), author));
        self.in_flight.push(PendingSend::new(temp_id, ticket.room_id, body.to_owned()));
        tracing::debug!(room_id = %ticket.room_id, %temp_id, "optimistic append");

        actions.extend([
            ChatAction::Render,
            ChatAction::ScrollToBottom,
            ChatAction::SendMessage { room_id: ticket.room_id, temp_id, body: body.to_owned() },
        ]);
        actions
    }

    /// Send the draft. The draft is cleared only if a send was issued.
    pub fn submit(&mut self) -> Vec<ChatAction> {
        let draft = std::mem::take(&mut self.draft);
        let actions = self.send(&draft);
        if actions.is_empty() {
            self.draft = draft;
        }
        actions
    }

    /// Record the viewport as it is right before the next event is applied.
    pub fn observe_viewport(&mut self, metrics: Option<ScrollMetrics>) {
        self.viewport = metrics;
    }

    /// Set the local author used for provisional entries.
    pub fn set_identity(&mut self, identity: Option<ChatUser>) {
        self.identity = identity;
    }

    fn hover_room(&mut self, room_id: RoomId) -> Vec<ChatAction> {
        let mut actions = self.latch_interaction();
        self.highlight_room(room_id);
        actions.extend(self.request_room(room_id));
        if !actions.contains(&ChatAction::Render) {
            actions.push(ChatAction::Render);
        }
        actions
    }

    fn route_changed(&mut self, route: Option<RoomId>) -> Vec<ChatAction> {
        if self.config.variant != SessionVariant::FullPage {
            tracing::debug!(?route, "ignoring route change outside full page");
            return vec![];
        }
        match route {
            Some(room_id) => self.request_room(room_id),
            None => vec![],
        }
    }

    fn interact(&mut self, kind: Interaction) -> Vec<ChatAction> {
        tracing::trace!(?kind, "interaction");
        self.latch_interaction()
    }

    /// Set the interaction latch; tear the rotation down on first set.
    fn latch_interaction(&mut self) -> Vec<ChatAction> {
        if self.latch.set() && self.rotator.stop() {
            tracing::debug!("rotation stopped by user interaction");
            return vec![ChatAction::StopRotation];
        }
        vec![]
    }

    fn highlight_room(&mut self, room_id: RoomId) {
        if let Some(index) = self.directory.rooms().iter().position(|r| r.id == room_id) {
            self.rotator.highlight(index);
        }
    }

    /// Record a room request and resolve it if the directory is available.
    fn request_room(&mut self, room_id: RoomId) -> Vec<ChatAction> {
        self.requested = Some(room_id);
        if !self.directory.is_resolved() {
            tracing::debug!(%room_id, "deferring selection until directory resolves");
            return vec![];
        }
        self.resolve_selection()
    }

    /// Pick the room to activate from the request and the directory.
    fn resolve_selection(&mut self) -> Vec<ChatAction> {
        let rooms = self.directory.rooms();
        let target = match self.requested {
            Some(room_id) => rooms.iter().find(|r| r.id == room_id).map(|r| r.id),
            None => rooms.first().map(|r| r.id),
        };

        let Some(room_id) = target else {
            if self.active.is_some() {
                tracing::debug!(requested = ?self.requested, "requested room not in directory");
                self.deactivate();
                return vec![ChatAction::Render];
            }
            return vec![];
        };

        let already_active = self.active == Some(room_id)
            && matches!(self.phase, RoomPhase::Loading(_) | RoomPhase::Ready(_));
        if already_active {
            return vec![];
        }
        self.activate(room_id)
    }

    fn activate(&mut self, room_id: RoomId) -> Vec<ChatAction> {
        // First load has no prior viewport worth preserving.
        self.scroll_on_load = self.active.is_none() || self.anchor.is_near_bottom(self.viewport);

        self.generation += 1;
        let ticket = LoadTicket { room_id, generation: self.generation };
        self.entries.clear();
        self.confirmed_sends.clear();
        self.active = Some(room_id);
        self.requested = Some(room_id);
        self.phase = RoomPhase::Loading(ticket);
        tracing::debug!(%room_id, generation = ticket.generation, "activating room");

        vec![ChatAction::LoadRoom { ticket }, ChatAction::Render]
    }

    fn deactivate(&mut self) {
        self.active = None;
        self.phase = RoomPhase::Idle;
        self.entries.clear();
        self.confirmed_sends.clear();
        self.generation += 1;
    }

    fn on_directory(&mut self, result: Result<Vec<Room>, ChatError>) -> Vec<ChatAction> {
        self.directory = match result {
            Ok(rooms) => {
                tracing::debug!(count = rooms.len(), "room directory loaded");
                DirectoryState::Loaded(rooms)
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to load room directory");
                DirectoryState::Failed
            },
        };

        let room_count = self.directory.rooms().len();
        self.rotator.clamp(room_count);

        let mut actions = Vec::new();
        if room_count == 0 {
            if self.rotator.stop() {
                actions.push(ChatAction::StopRotation);
            }
        } else if self.config.variant == SessionVariant::Embedded
            && self.rotator.start(room_count, self.latch)
        {
            actions.push(ChatAction::StartRotation { interval: self.config.rotation_interval() });
        }

        actions.extend(self.resolve_selection());
        if !actions.contains(&ChatAction::Render) {
            actions.push(ChatAction::Render);
        }
        actions
    }

    fn on_room_loaded(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Message>, ChatError>,
    ) -> Vec<ChatAction> {
        if self.phase != RoomPhase::Loading(ticket) {
            tracing::debug!(room_id = %ticket.room_id, "discarding stale room load");
            return vec![];
        }

        match result {
            Ok(messages) => {
                self.entries = messages.into_iter().map(ChatEntry::confirmed).collect();
                self.phase = RoomPhase::Ready(ticket);
                let mut actions = vec![ChatAction::Render];
                if self.scroll_on_load {
                    actions.push(ChatAction::ScrollToBottom);
                }
                actions
            },
            Err(e) => {
                tracing::warn!(room_id = %ticket.room_id, error = %e, "failed to load room");
                self.entries.clear();
                self.phase = RoomPhase::Failed(ticket);
                vec![ChatAction::Render]
            },
        }
    }

    fn on_room_refreshed(
        &mut self,
        ticket: LoadTicket,
        seq: u64,
        result: Result<Vec<Message>, ChatError>,
    ) -> Vec<ChatAction> {
        if self.phase != RoomPhase::Ready(ticket) {
            tracing::debug!(room_id = %ticket.room_id, "discarding stale refresh");
            return vec![];
        }
        if self.applied_refresh.is_some_and(|applied| applied > seq) {
            tracing::debug!(room_id = %ticket.room_id, seq, "discarding out-of-order refresh");
            return vec![];
        }
        let messages = match result {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(room_id = %ticket.room_id, error = %e, "history refresh failed");
                return vec![];
            },
        };
        self.applied_refresh = Some(seq);

        let was_near_bottom = self.anchor.is_near_bottom(self.viewport);
        let before = self.entries.len();

        let provisional: Vec<ChatEntry> =
            self.entries.iter().filter(|e| e.is_pending()).cloned().collect();
        let mut merged: Vec<ChatEntry> = messages.into_iter().map(ChatEntry::confirmed).collect();

        // Sends confirmed after this snapshot was requested may be missing from it.
        self.confirmed_sends.retain(|(at, _)| *at > seq);
        for (_, entry) in &self.confirmed_sends {
            if !merged.iter().any(|e| e.key == entry.key) {
                merged.push(entry.clone());
            }
        }
        merged.extend(provisional);

        if merged == self.entries {
            return vec![];
        }
        let grew = merged.len() > before;
        self.entries = merged;

        let mut actions = vec![ChatAction::Render];
        if grew && was_near_bottom {
            actions.push(ChatAction::ScrollToBottom);
        }
        actions
    }

    fn on_message_sent(
        &mut self,
        room_id: RoomId,
        temp_id: TempId,
        result: Result<Message, ChatError>,
    ) -> Vec<ChatAction> {
        let Some(index) = self.in_flight.iter().position(|p| p.temp_id() == temp_id) else {
            tracing::debug!(%temp_id, "send outcome for unknown message");
            return vec![];
        };
        let send = self.in_flight.remove(index);
        let body = send.body.clone();

        if let Err(e) = &result {
            tracing::warn!(%room_id, %temp_id, error = %e, "send failed; removing message");
        }
        let outcome = send.resolve(result);

        if self.active == Some(room_id) {
            self.entries = reconcile(std::mem::take(&mut self.entries), &outcome);
            if let SendState::Confirmed { message, .. } = &outcome
                && let Some(entry) = self.entry(EntryKey::Confirmed(message.id)).cloned()
            {
                self.confirmed_sends.push((self.refreshes, entry));
            }
        }

        if matches!(outcome, SendState::Failed { .. })
            && self.config.restore_failed_input
            && self.draft.is_empty()
        {
            self.draft = body;
        }

        vec![ChatAction::Render]
    }

    /// Configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Directory state.
    pub fn directory(&self) -> &DirectoryState {
        &self.directory
    }

    /// Rooms in the current directory snapshot.
    pub fn rooms(&self) -> &[Room] {
        self.directory.rooms()
    }

    /// Directory fetch in flight.
    pub fn is_loading_rooms(&self) -> bool {
        matches!(self.directory, DirectoryState::Loading(_))
    }

    /// Currently active room. `None` if no room is selectable.
    pub fn active_room(&self) -> Option<RoomId> {
        self.active
    }

    /// Directory entry of the active room.
    pub fn active_room_info(&self) -> Option<&Room> {
        self.active.and_then(|id| self.rooms().iter().find(|r| r.id == id))
    }

    /// Room requested by the user or route, possibly still unresolved.
    pub fn requested_room(&self) -> Option<RoomId> {
        self.requested
    }

    /// Lifecycle of the active room.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// History fetch in flight.
    pub fn is_loading_messages(&self) -> bool {
        matches!(self.phase, RoomPhase::Loading(_))
    }

    /// Active room failed to load.
    pub fn load_failed(&self) -> bool {
        matches!(self.phase, RoomPhase::Failed(_))
    }

    /// Message list of the active room, oldest first.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Sends awaiting their network outcome.
    pub fn in_flight(&self) -> &[PendingSend] {
        &self.in_flight
    }

    /// Index of the highlighted room.
    pub fn highlighted_index(&self) -> usize {
        self.rotator.highlighted()
    }

    /// Highlighted room. `None` if the directory is empty.
    pub fn highlighted_room(&self) -> Option<&Room> {
        self.rooms().get(self.rotator.highlighted())
    }

    /// Highlight rotation is running.
    pub fn is_rotating(&self) -> bool {
        self.rotator.is_running()
    }

    /// User has interacted with the widget.
    pub fn has_interacted(&self) -> bool {
        self.latch.is_set()
    }

    /// Composer contents.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Local author, if known.
    pub fn identity(&self) -> Option<&ChatUser> {
        self.identity.as_ref()
    }

    /// Viewport observed before the last event.
    pub fn viewport(&self) -> Option<ScrollMetrics> {
        self.viewport
    }

    /// Entry with the given key.
    pub fn entry(&self, key: EntryKey) -> Option<&ChatEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}
