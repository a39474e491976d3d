//! Line-based terminal driver.
//!
//! Input is one command or message per line. Output is an append-only
//! transcript: each render prints only what changed since the previous one.

use std::{
    collections::{HashSet, VecDeque},
    io::{self, Write},
};

use huddle_app::{
    ChatEntry, ChatEvent, ChatSession, Driver, EntryKey, RoomPhase, ScrollMetrics, TempId,
};
use huddle_core::{Room, RoomId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::commands::{message_line, room_line};

const HELP: &str = "\
commands:
  /rooms             reload the room list
  /join <id|name>    open a room
  /help              show this help
  /quit              leave
anything else is sent to the open room";

/// Parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Events to feed the session, in order.
    Events(Vec<ChatEvent>),
    /// Leave the session.
    Quit,
    /// Show usage.
    Help,
    /// Unusable input, with the reason.
    Invalid(String),
    /// Blank line.
    Empty,
}

/// Parse one input line.
///
/// Rooms are matched by id, or by name ignoring case, against `rooms`.
pub fn parse_line(line: &str, rooms: &[Room]) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Input::Events(vec![ChatEvent::DraftChanged(line.to_owned()), ChatEvent::Submit]);
    };

    let (name, arg) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let arg = arg.trim();
    match name {
        "rooms" => Input::Events(vec![ChatEvent::ReloadDirectory]),
        "join" if arg.is_empty() => Input::Invalid("usage: /join <id|name>".into()),
        "join" => match resolve_room(arg, rooms) {
            Some(room_id) => Input::Events(vec![ChatEvent::SelectRoom(room_id)]),
            None => Input::Invalid(format!("no room named {arg:?}")),
        },
        "quit" | "exit" => Input::Quit,
        "help" => Input::Help,
        other => Input::Invalid(format!("unknown command /{other}")),
    }
}

fn resolve_room(arg: &str, rooms: &[Room]) -> Option<RoomId> {
    if let Ok(id) = arg.parse::<u64>() {
        return Some(RoomId(id));
    }
    rooms.iter().find(|room| room.name.eq_ignore_ascii_case(arg)).map(|room| room.id)
}

/// What has already been printed.
#[derive(Debug, Default)]
struct Transcript {
    rooms: Option<Vec<Room>>,
    room: Option<RoomId>,
    can_send: bool,
    failure_shown: bool,
    shown: HashSet<EntryKey>,
    pending: Vec<(TempId, String)>,
}

/// Terminal driver reading lines from `R` and printing to `W`.
///
/// Has no viewport: new entries are simply appended, so every arrival
/// counts as seen.
pub struct LineDriver<R, W> {
    lines: Lines<R>,
    out: W,
    queued: VecDeque<ChatEvent>,
    transcript: Transcript,
}

impl<R, W> LineDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Create a driver over an input and an output stream.
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
            queued: VecDeque::new(),
            transcript: Transcript::default(),
        }
    }

    /// Feed `event` before reading any input, e.g. the room to open.
    #[must_use]
    pub fn with_initial(mut self, event: ChatEvent) -> Self {
        self.queued.push_back(event);
        self
    }

    fn print_rooms(&mut self, rooms: &[Room]) -> io::Result<()> {
        if rooms.is_empty() {
            return writeln!(self.out, "no rooms available");
        }
        writeln!(self.out, "rooms:")?;
        for room in rooms {
            writeln!(self.out, "{}", room_line(room))?;
        }
        Ok(())
    }

    fn print_entries(&mut self, entries: &[ChatEntry]) -> io::Result<()> {
        let live: HashSet<EntryKey> = entries.iter().map(|e| e.key).collect();
        let (mut vanished, still): (Vec<_>, Vec<_>) = std::mem::take(&mut self.transcript.pending)
            .into_iter()
            .partition(|(temp_id, _)| !live.contains(&EntryKey::Pending(*temp_id)));
        self.transcript.pending = still;

        for entry in entries {
            if !self.transcript.shown.insert(entry.key) {
                continue;
            }
            match entry.key {
                EntryKey::Pending(temp_id) => {
                    self.transcript.pending.push((temp_id, entry.body.clone()));
                    let line = message_line(&entry.author, &entry.body, None);
                    writeln!(self.out, "{line} …")?;
                },
                EntryKey::Confirmed(_) => {
                    // A confirmed copy of a provisional line already on screen.
                    if let Some(at) = vanished.iter().position(|(_, body)| *body == entry.body) {
                        vanished.remove(at);
                        continue;
                    }
                    let line = message_line(&entry.author, &entry.body, entry.created_at);
                    writeln!(self.out, "{line}")?;
                },
            }
        }

        for (_, body) in vanished {
            let delivered = entries.iter().any(|e| !e.is_pending() && e.body == body);
            if !delivered {
                writeln!(self.out, "! not sent: {body}")?;
            }
        }
        Ok(())
    }
}

impl<R, W> Driver for LineDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = io::Error;

    async fn poll_event(&mut self) -> Result<Option<ChatEvent>, Self::Error> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Ok(Some(event));
            }

            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };

            let rooms = self.transcript.rooms.as_deref().unwrap_or_default();
            match parse_line(&line, rooms) {
                Input::Events(events) => {
                    if matches!(events.last(), Some(ChatEvent::Submit)) && !self.transcript.can_send {
                        writeln!(self.out, "! no room open, use /join first")?;
                        continue;
                    }
                    self.queued.extend(events);
                },
                Input::Quit => return Ok(None),
                Input::Help => writeln!(self.out, "{HELP}")?,
                Input::Invalid(reason) => writeln!(self.out, "! {reason}")?,
                Input::Empty => {},
            }
            self.out.flush()?;
        }
    }

    fn viewport(&self) -> Option<ScrollMetrics> {
        None
    }

    fn render(&mut self, session: &ChatSession) -> Result<(), Self::Error> {
        if session.directory().is_resolved()
            && self.transcript.rooms.as_deref() != Some(session.rooms())
        {
            self.print_rooms(session.rooms())?;
            self.transcript.rooms = Some(session.rooms().to_vec());
        }

        if session.active_room() != self.transcript.room {
            let rooms = self.transcript.rooms.take();
            self.transcript = Transcript { rooms, ..Transcript::default() };
            self.transcript.room = session.active_room();
            if let Some(room_id) = session.active_room() {
                let name = session
                    .active_room_info()
                    .map_or_else(|| room_id.to_string(), |room| room.name.clone());
                writeln!(self.out, "# {name}")?;
            }
        }

        self.transcript.can_send =
            matches!(session.phase(), RoomPhase::Ready(_) | RoomPhase::Failed(_));
        match session.phase() {
            RoomPhase::Failed(_) if !self.transcript.failure_shown => {
                writeln!(self.out, "! could not open room, /join it again to retry")?;
                self.transcript.failure_shown = true;
            },
            RoomPhase::Loading(_) => self.transcript.failure_shown = false,
            _ => {},
        }

        self.print_entries(session.entries())?;
        self.out.flush()
    }

    fn scroll_to_bottom(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn navigate(&mut self, room_id: RoomId) {
        tracing::debug!(%room_id, "room opened");
    }

    fn stop(&mut self) {
        if let Err(error) = self.out.flush() {
            tracing::warn!(%error, "failed to flush transcript");
        }
    }
}
