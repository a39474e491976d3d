//! Generic runtime for chat session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`ChatSession`]: the session state machine
//! - [`ChatApi`]: the backend
//! - [`Driver`]: the view layer
//!
//! The loop is single-threaded and cooperative. Backend requests run as
//! futures inside the loop and are never aborted: a superseded result still
//! completes and is then discarded by the session.

use std::sync::Arc;

use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use huddle_core::{ChatApi, ChatUser, Credential, SessionStore, SessionUser};
use tokio::sync::watch;

use crate::{
    ChatAction, ChatConfig, ChatEvent, ChatSession, Driver,
    repeating::{Repeating, next_tick},
    synchronizer,
};

/// What woke the event loop.
enum Wake {
    Event(ChatEvent),
    Identity(Option<ChatUser>),
    SessionClosed,
    Closed,
}

/// Generic runtime that orchestrates a [`ChatSession`], a backend and a view.
///
/// # Type Parameters
///
/// - `D`: Platform-specific view driver
/// - `A`: Backend implementation
pub struct Runtime<D, A>
where
    D: Driver,
    A: ChatApi,
{
    driver: D,
    api: Arc<A>,
    session: ChatSession,
    in_flight: FuturesUnordered<BoxFuture<'static, ChatEvent>>,
    rotation: Option<Repeating>,
    polling: Option<Repeating>,
    credentials: Option<watch::Receiver<Option<Credential>>>,
}

impl<D, A> Runtime<D, A>
where
    D: Driver,
    A: ChatApi,
{
    /// Create a new runtime with the given driver and backend.
    pub fn new(driver: D, api: Arc<A>, config: ChatConfig) -> Self {
        Self {
            driver,
            api,
            session: ChatSession::new(config),
            in_flight: FuturesUnordered::new(),
            rotation: None,
            polling: None,
            credentials: None,
        }
    }

    /// Follow the signed-in user of a session store.
    ///
    /// The user becomes the author of provisional entries and is updated
    /// whenever the store's credential changes.
    #[must_use]
    pub fn with_session_store(mut self, store: &dyn SessionStore) -> Self {
        self.session.set_identity(store.user().as_ref().map(SessionUser::as_author));
        self.credentials = Some(store.subscribe());
        self
    }

    /// Run the event loop until the driver closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error. Backend
    /// failures never end the loop.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let actions = self.session.mount();
        self.execute(actions)?;

        loop {
            let wake = tokio::select! {
                input = self.driver.poll_event() => match input? {
                    Some(event) => Wake::Event(event),
                    None => Wake::Closed,
                },
                Some(event) = self.in_flight.next() => Wake::Event(event),
                () = next_tick(&mut self.rotation) => Wake::Event(ChatEvent::RotationTick),
                () = next_tick(&mut self.polling) => Wake::Event(ChatEvent::PollTick),
                identity = credential_change(&mut self.credentials) => match identity {
                    Some(identity) => Wake::Identity(identity),
                    None => Wake::SessionClosed,
                },
            };

            match wake {
                Wake::Event(event) => self.dispatch(event)?,
                Wake::Identity(identity) => self.session.set_identity(identity),
                Wake::SessionClosed => self.credentials = None,
                Wake::Closed => break,
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Feed one event to the session and execute the resulting actions.
    ///
    /// The viewport is sampled right before the event is applied, so scroll
    /// decisions see the list as it was before the mutation.
    fn dispatch(&mut self, event: ChatEvent) -> Result<(), D::Error> {
        self.session.observe_viewport(self.driver.viewport());
        let actions = self.session.handle(event);
        self.execute(actions)
    }

    /// Execute actions returned by the session.
    fn execute(&mut self, actions: Vec<ChatAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                ChatAction::Render => self.driver.render(&self.session)?,
                ChatAction::ScrollToBottom => self.driver.scroll_to_bottom()?,
                ChatAction::Navigate { room_id } => self.driver.navigate(room_id),
                ChatAction::StartRotation { interval } => {
                    self.rotation = Some(Repeating::start(interval));
                },
                ChatAction::StopRotation => self.rotation = None,
                ChatAction::StartPolling { interval } => {
                    self.polling = Some(Repeating::start(interval));
                },
                ChatAction::StopPolling => self.polling = None,

                // Backend operations run concurrently with input
                ChatAction::FetchRooms { .. }
                | ChatAction::LoadRoom { .. }
                | ChatAction::RefreshRoom { .. }
                | ChatAction::SendMessage { .. } => self.spawn_request(action),
            }
        }
        Ok(())
    }

    /// Queue a backend request; its completion comes back as an event.
    fn spawn_request(&mut self, action: ChatAction) {
        let api = Arc::clone(&self.api);
        let request: BoxFuture<'static, ChatEvent> = match action {
            ChatAction::FetchRooms { domain } => Box::pin(async move {
                ChatEvent::DirectoryLoaded(api.list_rooms(domain.as_deref()).await)
            }),
            ChatAction::LoadRoom { ticket } => Box::pin(async move {
                let result = synchronizer::synchronize(&*api, ticket.room_id).await;
                ChatEvent::RoomLoaded { ticket, result }
            }),
            ChatAction::RefreshRoom { ticket, seq } => Box::pin(async move {
                let result = synchronizer::refresh(&*api, ticket.room_id).await;
                ChatEvent::RoomRefreshed { ticket, seq, result }
            }),
            ChatAction::SendMessage { room_id, temp_id, body } => Box::pin(async move {
                let result = api.send_message(room_id, &body).await;
                ChatEvent::MessageSent { room_id, temp_id, result }
            }),
            other => {
                tracing::warn!("Unexpected non-request action: {:?}", other);
                return;
            },
        };
        self.in_flight.push(request);
    }

    /// Unmount the session and release timers and the view.
    fn shutdown(&mut self) {
        for action in self.session.unmount() {
            match action {
                ChatAction::StopRotation => self.rotation = None,
                ChatAction::StopPolling => self.polling = None,
                other => tracing::debug!("Ignoring action during shutdown: {:?}", other),
            }
        }
        self.in_flight.clear();
        self.driver.stop();
    }

    /// Get a reference to the session.
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Get a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut ChatSession {
        &mut self.session
    }
}

/// Wait for the next credential change.
///
/// Resolves to the new author, or `None` once the store is gone. Never
/// resolves when no store is attached.
async fn credential_change(
    credentials: &mut Option<watch::Receiver<Option<Credential>>>,
) -> Option<Option<ChatUser>> {
    let Some(rx) = credentials.as_mut() else {
        return std::future::pending().await;
    };
    rx.changed().await.ok()?;
    let author =
        rx.borrow_and_update().as_ref().and_then(|c| c.user.as_ref()).map(SessionUser::as_author);
    Some(author)
}
