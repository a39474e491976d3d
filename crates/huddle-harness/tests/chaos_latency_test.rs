//! Seeded latency chaos.
//!
//! Every backend call gets a random delay, so join, history, refresh and send
//! completions interleave differently per seed. A random user switches rooms,
//! sends and scrolls. Each rendered frame must satisfy the standard
//! invariants, and once the backend goes quiet the open room must converge
//! to exactly what the backend stored.

use std::{sync::Arc, time::Duration};

use huddle_app::{ChatConfig, ChatEvent, EntryKey, Runtime, SessionVariant};
use huddle_core::{ChatUser, HISTORY_LIMIT, Message, Room, RoomId};
use huddle_harness::{InvariantRegistry, SimApi, SimDriver, Step};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ROOMS: u64 = 3;

fn backend(seed: u64) -> SimApi {
    let bob = ChatUser::new(2, "Bob");
    let mut api = SimApi::new().with_jitter(seed, Duration::from_millis(250));
    for room in 1..=ROOMS {
        let history = (1..=5)
            .map(|i| Message::new(0, room, format!("seed-{room}-{i}"), bob.clone()))
            .collect();
        api = api.with_room(Room::new(room, format!("Room {room}"))).with_history(room, history);
    }
    api
}

fn random_script(seed: u64) -> Vec<Step> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut script = vec![Step::Event(ChatEvent::RouteChanged(Some(RoomId(1))))];
    for i in 0..40 {
        match rng.gen_range(0..10) {
            0..=1 => {
                let room = rng.gen_range(1..=ROOMS);
                script.push(Step::Event(ChatEvent::SelectRoom(RoomId(room))));
            },
            2..=5 => {
                script.push(Step::Event(ChatEvent::DraftChanged(format!("s{seed}-{i}"))));
                script.push(Step::Event(ChatEvent::Submit));
            },
            6 => script.push(Step::ScrollTo(rng.gen_range(0.0..400.0))),
            _ => script.push(Step::Wait(Duration::from_millis(rng.gen_range(0..300)))),
        }
    }
    script.push(Step::Wait(Duration::from_secs(3)));
    script.push(Step::Close);
    script
}

fn config() -> ChatConfig {
    ChatConfig { poll_interval_ms: Some(500), ..ChatConfig::for_variant(SessionVariant::FullPage) }
}

async fn run_seed(seed: u64) {
    let api = Arc::new(backend(seed));
    let driver = SimDriver::new(random_script(seed)).with_invariants(InvariantRegistry::standard());
    let view = driver.view();

    Runtime::new(driver, Arc::clone(&api), config()).run().await.unwrap();

    assert!(view.violations().is_empty(), "seed {seed}: {:?}", view.violations());

    let last = view.last_frame().unwrap();
    let room = last.active_room.unwrap();
    assert!(last.in_flight.is_empty(), "seed {seed}: sends still in flight");
    assert!(
        last.entries.iter().all(|e| matches!(e.key, EntryKey::Confirmed(_))),
        "seed {seed}: provisional entries left behind"
    );

    let stored = api.history(room);
    let newest = &stored[stored.len().saturating_sub(HISTORY_LIMIT)..];
    let expected: Vec<&str> = newest.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(last.bodies(), expected, "seed {seed}: room {room} did not converge");
}

#[tokio::test(start_paused = true)]
async fn random_sessions_converge() {
    for seed in 0..64 {
        run_seed(seed).await;
    }
}

#[tokio::test(start_paused = true)]
async fn every_send_is_stored_once() {
    for seed in 100..132 {
        let api = Arc::new(backend(seed));
        let driver = SimDriver::new(random_script(seed));

        Runtime::new(driver, Arc::clone(&api), config()).run().await.unwrap();

        for room in 1..=ROOMS {
            let history = api.history(room);
            let mut bodies: Vec<&str> = history.iter().map(|m| m.body.as_str()).collect();
            let total = bodies.len();
            bodies.sort_unstable();
            bodies.dedup();
            assert_eq!(bodies.len(), total, "seed {seed}: duplicate post in room {room}");
        }
    }
}
