//! Fuzz target for the chat session state machine
//!
//! # Strategy
//!
//! - Backend requests are parked and completed in fuzzer-chosen order, with
//!   success or failure chosen per completion
//! - Rooms 1-3 are listed; room 9 never is
//! - Both session variants
//!
//! # Invariants
//!
//! - Standard session invariants hold after every step
//! - No server message id is shown twice
//! - A failed send never leaves its provisional entry behind

#![no_main]

use arbitrary::Arbitrary;
use huddle_app::{
    ChatAction, ChatConfig, ChatEvent, ChatSession, EntryKey, Interaction, SessionVariant,
};
use huddle_core::{ChatError, ChatUser, Message, Room, RoomId};
use huddle_harness::{InvariantRegistry, SessionSnapshot};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    full_page: bool,
    ops: Vec<Op>,
}

#[derive(Debug, Arbitrary)]
enum Op {
    Select(RoomChoice),
    Hover(RoomChoice),
    Route(RoomChoice),
    Send(String),
    Complete { index: u8, ok: bool },
    Poll,
    Rotate,
    PointerDown,
    Reload,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum RoomChoice {
    General,
    Support,
    Empty,
    Unlisted,
}

impl RoomChoice {
    fn id(self) -> RoomId {
        match self {
            Self::General => RoomId(1),
            Self::Support => RoomId(2),
            Self::Empty => RoomId(3),
            Self::Unlisted => RoomId(9),
        }
    }
}

fn history(room_id: RoomId) -> Result<Vec<Message>, ChatError> {
    let author = ChatUser::new(5, "Alice");
    match room_id.0 {
        1 => Ok(vec![Message::new(101, 1, "hello", author)]),
        2 => Ok(vec![
            Message::new(201, 2, "hi", author.clone()),
            Message::new(202, 2, "yo", author),
        ]),
        3 => Ok(Vec::new()),
        _ => Err(ChatError::NotFound(room_id.to_string())),
    }
}

fuzz_target!(|input: Input| {
    let variant =
        if input.full_page { SessionVariant::FullPage } else { SessionVariant::Embedded };
    let mut session = ChatSession::new(ChatConfig::for_variant(variant));
    let invariants = InvariantRegistry::standard();
    let rooms = vec![Room::new(1, "General"), Room::new(2, "Support"), Room::new(3, "Empty")];
    let mut parked: Vec<ChatAction> = Vec::new();
    let mut next_id = 1000;

    let actions = session.mount();
    parked.extend(actions.into_iter().filter(ChatAction::is_request));

    for op in input.ops {
        let mut failed_send = None;
        let actions = match op {
            Op::Select(room) => session.handle(ChatEvent::SelectRoom(room.id())),
            Op::Hover(room) => session.handle(ChatEvent::HoverRoom(room.id())),
            Op::Route(room) => session.handle(ChatEvent::RouteChanged(Some(room.id()))),
            Op::Send(body) => session.send(&body),
            Op::Complete { index, ok } => {
                if parked.is_empty() {
                    continue;
                }
                let request = parked.remove(usize::from(index) % parked.len());
                let failure = ChatError::Http { status: 503, url: "/chat".into() };
                let event = match request {
                    ChatAction::FetchRooms { .. } => {
                        let result = if ok { Ok(rooms.clone()) } else { Err(failure) };
                        ChatEvent::DirectoryLoaded(result)
                    },
                    ChatAction::LoadRoom { ticket } => ChatEvent::RoomLoaded {
                        ticket,
                        result: if ok { history(ticket.room_id) } else { Err(failure) },
                    },
                    ChatAction::RefreshRoom { ticket, seq } => ChatEvent::RoomRefreshed {
                        ticket,
                        seq,
                        result: if ok { history(ticket.room_id) } else { Err(failure) },
                    },
                    ChatAction::SendMessage { room_id, temp_id, body } => {
                        next_id += 1;
                        let result = if ok {
                            Ok(Message::new(next_id, room_id, body, ChatUser::new(1, "Me")))
                        } else {
                            failed_send = Some(temp_id);
                            Err(failure)
                        };
                        ChatEvent::MessageSent { room_id, temp_id, result }
                    },
                    _ => continue,
                };
                session.handle(event)
            },
            Op::Poll => session.handle(ChatEvent::PollTick),
            Op::Rotate => session.handle(ChatEvent::RotationTick),
            Op::PointerDown => session.handle(ChatEvent::Interaction(Interaction::PointerDown)),
            Op::Reload => session.handle(ChatEvent::ReloadDirectory),
        };
        parked.extend(actions.into_iter().filter(ChatAction::is_request));

        let snapshot = SessionSnapshot::from_session(&session);
        if let Err(violations) = invariants.check_all(&snapshot) {
            panic!("invariants violated: {violations:?}");
        }

        let mut confirmed: Vec<_> = session
            .entries()
            .iter()
            .filter_map(|e| match e.key {
                EntryKey::Confirmed(id) => Some(id),
                EntryKey::Pending(_) => None,
            })
            .collect();
        let shown = confirmed.len();
        confirmed.sort_unstable();
        confirmed.dedup();
        assert_eq!(confirmed.len(), shown, "message shown twice");

        if let Some(temp_id) = failed_send {
            assert!(session.entry(EntryKey::Pending(temp_id)).is_none());
        }
    }
});
