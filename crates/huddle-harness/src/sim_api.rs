//! In-memory backend implementing the [`ChatApi`] trait.
//!
//! `SimApi` plays the role of the chat server in deterministic tests. It
//! keeps rooms, memberships and histories in memory and delays every call by
//! a configurable latency, so tests running on tokio's paused clock can
//! script exactly which response lands first.
//!
//! Latency of a call is the sum of:
//! - the per-endpoint latency ([`SimApi::set_latency`]),
//! - the per-room latency for room-scoped calls ([`SimApi::set_room_latency`]),
//! - optional seeded jitter ([`SimApi::with_jitter`]).

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use huddle_core::{ChatApi, ChatError, ChatUser, HISTORY_LIMIT, Message, Room, RoomId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Backend operation, for latency, failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /chat/rooms`
    ListRooms,
    /// `POST /chat/rooms/{id}/join`
    JoinRoom,
    /// `GET /chat/rooms/{id}/messages`
    FetchHistory,
    /// `POST /chat/rooms/{id}/messages`
    SendMessage,
}

impl Endpoint {
    fn path(self, room_id: Option<RoomId>) -> String {
        let room = room_id.map_or_else(String::new, |id| id.to_string());
        match self {
            Self::ListRooms => "/chat/rooms".to_string(),
            Self::JoinRoom => format!("/chat/rooms/{room}/join"),
            Self::FetchHistory | Self::SendMessage => format!("/chat/rooms/{room}/messages"),
        }
    }
}

#[derive(Default)]
struct Backend {
    rooms: Vec<Room>,
    histories: HashMap<RoomId, Vec<Message>>,
    members: HashSet<RoomId>,
    next_message_id: u64,
    latency: HashMap<Endpoint, Duration>,
    room_latency: HashMap<RoomId, Duration>,
    jitter: Option<(ChaCha8Rng, Duration)>,
    failures: HashMap<Endpoint, VecDeque<ChatError>>,
    calls: HashMap<Endpoint, usize>,
    joins: HashMap<RoomId, usize>,
}

impl Backend {
    /// Count the call and decide its latency and injected failure.
    fn begin(
        &mut self,
        endpoint: Endpoint,
        room_id: Option<RoomId>,
    ) -> (Duration, Option<ChatError>) {
        *self.calls.entry(endpoint).or_default() += 1;

        let mut delay = self.latency.get(&endpoint).copied().unwrap_or_default();
        if let Some(room_id) = room_id {
            delay += self.room_latency.get(&room_id).copied().unwrap_or_default();
        }
        if let Some((rng, max)) = self.jitter.as_mut() {
            let max_ms = max.as_millis() as u64;
            delay += Duration::from_millis(rng.gen_range(0..=max_ms));
        }

        let failure = self.failures.get_mut(&endpoint).and_then(VecDeque::pop_front);
        (delay, failure)
    }

    fn room_exists(&self, room_id: RoomId) -> bool {
        self.rooms.iter().any(|r| r.id == room_id)
    }

    fn append(&mut self, mut message: Message) -> Message {
        if message.id.0 == 0 {
            message.id = self.next_message_id.into();
        }
        self.next_message_id = self.next_message_id.max(message.id.0 + 1);
        self.histories.entry(message.room_id).or_default().push(message.clone());
        message
    }
}

/// Scripted in-memory chat backend.
pub struct SimApi {
    backend: Mutex<Backend>,
    author: ChatUser,
}

impl Default for SimApi {
    fn default() -> Self {
        Self::new()
    }
}

impl SimApi {
    /// Create an empty backend. Messages sent through it are authored by
    /// user 1 ("Me").
    pub fn new() -> Self {
        let backend = Backend { next_message_id: 1, ..Backend::default() };
        Self { backend: Mutex::new(backend), author: ChatUser::new(1, "Me") }
    }

    /// Add a room to the directory.
    #[must_use]
    pub fn with_room(self, room: Room) -> Self {
        self.backend().rooms.push(room);
        self
    }

    /// Seed a room's history, oldest first.
    #[must_use]
    pub fn with_history(self, room_id: impl Into<RoomId>, messages: Vec<Message>) -> Self {
        {
            let mut backend = self.backend();
            let room_id = room_id.into();
            for mut message in messages {
                message.room_id = room_id;
                backend.append(message);
            }
        }
        self
    }

    /// Author of messages sent through [`ChatApi::send_message`].
    #[must_use]
    pub fn with_author(mut self, author: ChatUser) -> Self {
        self.author = author;
        self
    }

    /// Add up to `max` of seeded random latency to every call.
    #[must_use]
    pub fn with_jitter(self, seed: u64, max: Duration) -> Self {
        self.backend().jitter = Some((ChaCha8Rng::seed_from_u64(seed), max));
        self
    }

    /// Delay every call to `endpoint` by `latency`.
    pub fn set_latency(&self, endpoint: Endpoint, latency: Duration) {
        self.backend().latency.insert(endpoint, latency);
    }

    /// Delay every call scoped to `room_id` by `latency`.
    pub fn set_room_latency(&self, room_id: impl Into<RoomId>, latency: Duration) {
        self.backend().room_latency.insert(room_id.into(), latency);
    }

    /// Fail the next call to `endpoint` with `error`.
    ///
    /// Failures queue up: injecting twice fails the next two calls.
    pub fn fail_next(&self, endpoint: Endpoint, error: ChatError) {
        self.backend().failures.entry(endpoint).or_default().push_back(error);
    }

    /// Replace the room directory.
    pub fn set_rooms(&self, rooms: Vec<Room>) {
        self.backend().rooms = rooms;
    }

    /// Post a message as another user, as if it arrived from elsewhere.
    pub fn post(&self, room_id: impl Into<RoomId>, body: &str, user: ChatUser) -> Message {
        let message = Message::new(0, room_id.into(), body, user);
        self.backend().append(message)
    }

    /// Number of calls made to `endpoint`.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.backend().calls.get(&endpoint).copied().unwrap_or_default()
    }

    /// Number of join calls for `room_id`.
    pub fn joins(&self, room_id: impl Into<RoomId>) -> usize {
        self.backend().joins.get(&room_id.into()).copied().unwrap_or_default()
    }

    /// Whether the local user is a member of `room_id`.
    pub fn is_member(&self, room_id: impl Into<RoomId>) -> bool {
        self.backend().members.contains(&room_id.into())
    }

    /// Full stored history of `room_id`.
    pub fn history(&self, room_id: impl Into<RoomId>) -> Vec<Message> {
        self.backend().histories.get(&room_id.into()).cloned().unwrap_or_default()
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, endpoint: Endpoint, room_id: Option<RoomId>) -> (Duration, Option<ChatError>) {
        let (delay, failure) = self.backend().begin(endpoint, room_id);
        tracing::trace!(?endpoint, ?room_id, ?delay, failing = failure.is_some(), "sim call");
        (delay, failure)
    }
}

fn not_found(endpoint: Endpoint, room_id: RoomId) -> ChatError {
    ChatError::NotFound(endpoint.path(Some(room_id)))
}

impl ChatApi for SimApi {
    async fn list_rooms(&self, domain: Option<&str>) -> Result<Vec<Room>, ChatError> {
        let (delay, failure) = self.begin(Endpoint::ListRooms, None);
        tokio::time::sleep(delay).await;
        if let Some(e) = failure {
            return Err(e);
        }

        let rooms = self
            .backend()
            .rooms
            .iter()
            .filter(|r| domain.is_none_or(|d| r.domain_key == d))
            .cloned()
            .collect();
        Ok(rooms)
    }

    async fn join_room(&self, room_id: RoomId) -> Result<(), ChatError> {
        let (delay, failure) = self.begin(Endpoint::JoinRoom, Some(room_id));
        tokio::time::sleep(delay).await;
        if let Some(e) = failure {
            return Err(e);
        }

        let mut backend = self.backend();
        if !backend.room_exists(room_id) {
            return Err(not_found(Endpoint::JoinRoom, room_id));
        }
        *backend.joins.entry(room_id).or_default() += 1;
        backend.members.insert(room_id);
        Ok(())
    }

    async fn fetch_history(&self, room_id: RoomId) -> Result<Vec<Message>, ChatError> {
        let (delay, failure) = self.begin(Endpoint::FetchHistory, Some(room_id));
        tokio::time::sleep(delay).await;
        if let Some(e) = failure {
            return Err(e);
        }

        let backend = self.backend();
        if !backend.room_exists(room_id) {
            return Err(not_found(Endpoint::FetchHistory, room_id));
        }
        let history = backend.histories.get(&room_id).map(Vec::as_slice).unwrap_or_default();
        let start = history.len().saturating_sub(HISTORY_LIMIT);
        Ok(history[start..].to_vec())
    }

    async fn send_message(&self, room_id: RoomId, body: &str) -> Result<Message, ChatError> {
        let (delay, failure) = self.begin(Endpoint::SendMessage, Some(room_id));
        tokio::time::sleep(delay).await;
        if let Some(e) = failure {
            return Err(e);
        }

        let mut backend = self.backend();
        if !backend.room_exists(room_id) {
            return Err(not_found(Endpoint::SendMessage, room_id));
        }
        if !backend.members.contains(&room_id) {
            return Err(ChatError::Http {
                status: 403,
                url: Endpoint::SendMessage.path(Some(room_id)),
            });
        }
        let message = Message::new(0, room_id, body, self.author.clone());
        Ok(backend.append(message))
    }
}
