//! Fuzz target for terminal input parsing
//!
//! # Invariants
//!
//! - Never panics on arbitrary UTF-8
//! - Text lines become exactly one draft followed by a submit
//! - `/join` only resolves to listed rooms or numeric ids

#![no_main]

use huddle_app::ChatEvent;
use huddle_cli::{Input, parse_line};
use huddle_core::Room;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|line: &str| {
    let rooms = [Room::new(1, "General"), Room::new(2, "Support")];

    match parse_line(line, &rooms) {
        Input::Events(events) if !line.trim().starts_with('/') => {
            assert!(matches!(
                events.as_slice(),
                [ChatEvent::DraftChanged(draft), ChatEvent::Submit] if draft == line.trim()
            ));
        },
        Input::Events(events) => {
            for event in events {
                if let ChatEvent::SelectRoom(room_id) = event {
                    let arg = line.trim().trim_start_matches("/join").trim();
                    let listed = rooms.iter().any(|r| r.id == room_id);
                    assert!(listed || arg.parse::<u64>() == Ok(room_id.0));
                }
            }
        },
        Input::Empty => assert!(line.trim().is_empty()),
        Input::Quit | Input::Help | Input::Invalid(_) => {},
    }
});
