//! One-shot subcommands.
//!
//! Each command runs a single backend exchange and prints the result. They
//! share the transcript format of the interactive session.

use std::io::Write;

use chrono::{DateTime, Local, Utc};
use huddle_app::synchronizer;
use huddle_core::{ChatApi, ChatUser, Message, Room, RoomId};

use crate::CliError;

/// Print the room directory, one `id  name` line per room.
///
/// # Errors
///
/// Returns an error if the backend call or the write fails.
pub async fn rooms<A: ChatApi, W: Write>(
    api: &A,
    domain: Option<&str>,
    out: &mut W,
) -> Result<(), CliError> {
    let rooms = api.list_rooms(domain).await?;
    if rooms.is_empty() {
        writeln!(out, "no rooms")?;
    }
    for room in &rooms {
        writeln!(out, "{}", room_line(room))?;
    }
    Ok(())
}

/// Join a room and print its recent history.
///
/// # Errors
///
/// Returns an error if the join, the fetch or the write fails.
pub async fn history<A: ChatApi, W: Write>(
    api: &A,
    room_id: RoomId,
    out: &mut W,
) -> Result<(), CliError> {
    let messages = synchronizer::synchronize(api, room_id).await?;
    for message in &messages {
        writeln!(out, "{}", message_line(&message.user, &message.body, message.created_at))?;
    }
    Ok(())
}

/// Join a room, post `body` and print the confirmed message.
///
/// # Errors
///
/// Returns an error if the join, the send or the write fails.
pub async fn send<A: ChatApi, W: Write>(
    api: &A,
    room_id: RoomId,
    body: &str,
    out: &mut W,
) -> Result<Message, CliError> {
    api.join_room(room_id).await?;
    let message = api.send_message(room_id, body).await?;
    tracing::info!(%room_id, id = %message.id, "message sent");
    writeln!(out, "{}", message_line(&message.user, &message.body, message.created_at))?;
    Ok(message)
}

/// One directory line.
pub fn room_line(room: &Room) -> String {
    if room.domain_key.is_empty() {
        format!("{:>4}  {}", room.id, room.name)
    } else {
        format!("{:>4}  {} ({})", room.id, room.name, room.domain_key)
    }
}

/// One transcript line: `[HH:MM] Name: body`, without the time prefix when
/// the message has no timestamp.
pub fn message_line(author: &ChatUser, body: &str, created_at: Option<DateTime<Utc>>) -> String {
    match created_at {
        Some(at) => {
            format!("[{}] {}: {}", at.with_timezone(&Local).format("%H:%M"), author.name, body)
        },
        None => format!("{}: {}", author.name, body),
    }
}
