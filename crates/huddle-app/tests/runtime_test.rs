//! End-to-end tests for the chat runtime.
//!
//! # Test Strategy
//!
//! Each test runs the real [`Runtime`] against the in-memory [`SimApi`]
//! backend and a scripted [`SimDriver`] on tokio's paused clock:
//! 1. Configure backend latency to force a specific completion order
//! 2. Script what the user does and when
//! 3. Run until the script closes the view
//! 4. Verify rendered frames, viewport position and backend calls
//!
//! Every rendered frame is also checked against the standard invariants.

use std::{sync::Arc, time::Duration};

use huddle_app::{ChatConfig, ChatEvent, EntryKey, Interaction, Runtime, SessionVariant};
use huddle_core::{
    ChatApi, ChatError, ChatUser, Credential, MemorySession, Message, MessageId, Room, RoomId,
    SessionStore, SessionUser,
};
use huddle_harness::{Endpoint, InvariantRegistry, SimApi, SimDriver, SimView, SimViewport, Step};

fn ms(millis: u64) -> Step {
    Step::Wait(Duration::from_millis(millis))
}

fn event(event: ChatEvent) -> Step {
    Step::Event(event)
}

fn alice() -> ChatUser {
    ChatUser::new(5, "Alice")
}

/// Directory with General (1) and Support (2).
fn backend() -> SimApi {
    SimApi::new().with_room(Room::new(1, "General")).with_room(Room::new(2, "Support"))
}

fn numbered(room: u64, count: u64) -> Vec<Message> {
    (1..=count)
        .map(|i| Message::new(room * 100 + i, room, format!("r{room}-{i}"), alice()))
        .collect()
}

/// Run a full session and return what was rendered.
async fn run(api: &Arc<SimApi>, config: ChatConfig, script: Vec<Step>) -> SimView {
    run_with(api, config, SimViewport::default(), script).await
}

async fn run_with(
    api: &Arc<SimApi>,
    config: ChatConfig,
    viewport: SimViewport,
    script: Vec<Step>,
) -> SimView {
    let driver = SimDriver::new(script)
        .with_viewport(viewport)
        .with_invariants(InvariantRegistry::standard());
    let view = driver.view();

    Runtime::new(driver, Arc::clone(api), config).run().await.unwrap();

    assert!(view.is_stopped());
    assert!(view.violations().is_empty(), "violations: {:?}", view.violations());
    view
}

fn full_page() -> ChatConfig {
    ChatConfig::for_variant(SessionVariant::FullPage)
}

#[tokio::test(start_paused = true)]
async fn selecting_room_joins_then_shows_history() {
    let api = Arc::new(backend().with_history(1, vec![Message::new(101, 1, "hi", alice())]));
    api.set_latency(Endpoint::JoinRoom, Duration::from_millis(100));
    api.set_latency(Endpoint::FetchHistory, Duration::from_millis(100));

    let view = run_with(
        &api,
        full_page(),
        SimViewport::new(30.0, 40.0),
        vec![event(ChatEvent::SelectRoom(RoomId(1))), ms(1000), Step::Close],
    )
    .await;

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.rooms, vec![RoomId(1), RoomId(2)]);
    assert_eq!(frame.active_room, Some(RoomId(1)));
    assert_eq!(frame.entries.len(), 1);
    assert_eq!(frame.entries[0].key, EntryKey::Confirmed(MessageId(101)));
    assert_eq!(frame.entries[0].body, "hi");
    assert_eq!(frame.entries[0].author, "Alice");

    assert_eq!(api.calls(Endpoint::JoinRoom), 1);
    assert_eq!(api.calls(Endpoint::FetchHistory), 1);
    assert!(api.is_member(1));

    // Content overflows the 30px viewport; it must have been scrolled.
    assert!(view.viewport().is_at_bottom());
    assert!(view.viewport().scroll_top() > 0.0);
}

#[tokio::test(start_paused = true)]
async fn failed_join_skips_history_fetch() {
    let api = Arc::new(backend().with_history(1, numbered(1, 3)));
    api.fail_next(Endpoint::JoinRoom, ChatError::Http { status: 500, url: "/x".into() });

    let view = run(&api, full_page(), vec![ms(100), Step::Close]).await;

    assert_eq!(api.calls(Endpoint::FetchHistory), 0);
    let frame = view.last_frame().unwrap();
    assert_eq!(frame.active_room, Some(RoomId(1)));
    assert!(frame.entries.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_room_retries_on_reselect() {
    let api = Arc::new(backend().with_history(1, numbered(1, 3)));
    api.fail_next(Endpoint::FetchHistory, ChatError::Timeout);

    let view = run(&api, full_page(), vec![
        ms(100),
        event(ChatEvent::SelectRoom(RoomId(1))),
        ms(100),
        Step::Close,
    ])
    .await;

    assert_eq!(api.calls(Endpoint::FetchHistory), 2);
    assert_eq!(view.last_frame().unwrap().bodies(), vec!["r1-1", "r1-2", "r1-3"]);
}

#[tokio::test(start_paused = true)]
async fn slow_room_result_never_replaces_newer_selection() {
    let api = Arc::new(backend().with_history(1, numbered(1, 4)).with_history(2, numbered(2, 2)));
    api.set_room_latency(1, Duration::from_millis(800));
    api.set_room_latency(2, Duration::from_millis(50));

    // Room 1 is activated by default, then the user switches to room 2
    // while room 1 is still loading.
    let view = run(&api, full_page(), vec![
        ms(10),
        event(ChatEvent::SelectRoom(RoomId(2))),
        ms(3000),
        Step::Close,
    ])
    .await;

    // Room 1 did complete on the backend.
    assert_eq!(api.calls(Endpoint::FetchHistory), 2);
    assert!(api.is_member(1));

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.active_room, Some(RoomId(2)));
    assert_eq!(frame.bodies(), vec!["r2-1", "r2-2"]);
    for frame in view.frames() {
        assert!(frame.entries.iter().all(|e| e.room_id != RoomId(1)), "room 1 leaked: {frame:?}");
    }
    assert_eq!(view.navigations(), vec![RoomId(2)]);
}

#[tokio::test(start_paused = true)]
async fn rapid_switching_settles_on_last_room() {
    let api = Arc::new(backend().with_history(1, numbered(1, 2)).with_history(2, numbered(2, 3)));
    api.set_latency(Endpoint::JoinRoom, Duration::from_millis(200));

    let view = run(&api, full_page(), vec![
        ms(10),
        event(ChatEvent::SelectRoom(RoomId(2))),
        ms(10),
        event(ChatEvent::SelectRoom(RoomId(1))),
        ms(10),
        event(ChatEvent::SelectRoom(RoomId(2))),
        ms(2000),
        Step::Close,
    ])
    .await;

    // Room 2 was joined twice; both calls succeed and history shows once.
    assert_eq!(api.joins(2), 2);
    let frame = view.last_frame().unwrap();
    assert_eq!(frame.active_room, Some(RoomId(2)));
    assert_eq!(frame.bodies(), vec!["r2-1", "r2-2", "r2-3"]);
}

#[tokio::test(start_paused = true)]
async fn joining_twice_concurrently_is_harmless() {
    let api = backend().with_history(1, numbered(1, 2));
    api.set_latency(Endpoint::JoinRoom, Duration::from_millis(100));

    let (first, second) = tokio::join!(api.join_room(RoomId(1)), api.join_room(RoomId(1)));
    assert!(first.is_ok());
    assert!(second.is_ok());

    let history = api.fetch_history(RoomId(1)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(api.calls(Endpoint::FetchHistory), 1);
}

fn polling() -> ChatConfig {
    ChatConfig { poll_interval_ms: Some(1000), ..full_page() }
}

/// Post a message from another user after `delay`.
async fn post_later(api: &SimApi, delay: Duration) {
    tokio::time::sleep(delay).await;
    api.post(1, "fresh", alice());
}

#[tokio::test(start_paused = true)]
async fn arrival_scrolls_when_reader_is_at_bottom() {
    // 20 rows of 40px in a 400px viewport: bottom is at 400.
    let api = Arc::new(backend().with_history(1, numbered(1, 20)));

    let (view, ()) = tokio::join!(
        run(&api, polling(), vec![ms(3500), Step::Close]),
        post_later(&api, Duration::from_millis(1500)),
    );

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.entries.len(), 21);
    assert!(view.viewport().is_at_bottom());
    assert!((view.viewport().scroll_top() - 440.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn arrival_scrolls_when_within_threshold() {
    let api = Arc::new(backend().with_history(1, numbered(1, 20)));

    // 50px above the bottom is still "near".
    let (view, ()) = tokio::join!(
        run(&api, polling(), vec![ms(500), Step::ScrollTo(350.0), ms(3000), Step::Close]),
        post_later(&api, Duration::from_millis(1500)),
    );

    assert!(view.viewport().is_at_bottom());
}

#[tokio::test(start_paused = true)]
async fn arrival_keeps_position_when_reading_history() {
    let api = Arc::new(backend().with_history(1, numbered(1, 20)));

    let (view, ()) = tokio::join!(
        run(&api, polling(), vec![ms(500), Step::ScrollTo(0.0), ms(3000), Step::Close]),
        post_later(&api, Duration::from_millis(1500)),
    );

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.entries.len(), 21);
    assert!(view.viewport().scroll_top().abs() < f64::EPSILON);
    assert!(!view.viewport().is_at_bottom());
}

#[tokio::test(start_paused = true)]
async fn rotation_stops_after_pointer_down() {
    let api = Arc::new(backend().with_room(Room::new(3, "IT")));

    // Three ticks at 2.5s, 5s and 7.5s, then a pointer-down, then three more
    // tick intervals. The draft change forces a final render.
    let view = run(&api, ChatConfig::default(), vec![
        ms(7600),
        event(ChatEvent::Interaction(Interaction::PointerDown)),
        ms(7600),
        event(ChatEvent::DraftChanged("x".into())),
        Step::Close,
    ])
    .await;

    let frames = view.frames();
    let (before, after): (Vec<_>, Vec<_>) = frames.iter().partition(|f| !f.interacted);

    let mut seen: Vec<usize> = before.iter().map(|f| f.highlighted).collect();
    seen.dedup();
    assert!(seen.len() > 1, "highlight never moved: {seen:?}");
    assert_eq!(before.last().unwrap().highlighted, 0);

    assert!(!after.is_empty());
    assert!(after.iter().all(|f| f.highlighted == 0 && !f.rotating));
    // Rotation only moved the highlight; the active room never changed.
    assert!(frames.iter().all(|f| f.active_room.is_none_or(|id| id == RoomId(1))));
}

#[tokio::test(start_paused = true)]
async fn hover_switches_room_and_stops_rotation() {
    let api = Arc::new(backend().with_history(2, numbered(2, 1)));

    let view = run(&api, ChatConfig::default(), vec![
        ms(100),
        event(ChatEvent::HoverRoom(RoomId(2))),
        ms(6000),
        Step::Close,
    ])
    .await;

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.active_room, Some(RoomId(2)));
    assert_eq!(frame.highlighted_room(), Some(RoomId(2)));
    assert!(!frame.rotating);
    assert!(view.navigations().is_empty());
}

fn submit(text: &str) -> Vec<Step> {
    vec![event(ChatEvent::DraftChanged(text.into())), event(ChatEvent::Submit)]
}

#[tokio::test(start_paused = true)]
async fn sent_message_appears_once_and_is_confirmed() {
    let api = Arc::new(backend().with_history(1, numbered(1, 2)));
    api.set_latency(Endpoint::SendMessage, Duration::from_millis(300));

    let mut script = vec![ms(100)];
    script.extend(submit("  hello "));
    script.extend([ms(1000), Step::Close]);
    let view = run(&api, full_page(), script).await;

    // Shown immediately as provisional, before the backend answered.
    let provisional = view
        .frames()
        .into_iter()
        .find(|f| f.entries.iter().any(|e| matches!(e.key, EntryKey::Pending(_))))
        .unwrap();
    assert_eq!(provisional.bodies(), vec!["r1-1", "r1-2", "hello"]);
    assert_eq!(provisional.entries[2].author, "You");

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.bodies(), vec!["r1-1", "r1-2", "hello"]);
    assert!(matches!(frame.entries[2].key, EntryKey::Confirmed(_)));
    assert_eq!(frame.entries[2].author, "Me");
    assert!(frame.in_flight.is_empty());
    assert_eq!(api.history(1).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_send_removes_provisional_message() {
    let api = Arc::new(backend().with_history(1, numbered(1, 2)));
    api.set_latency(Endpoint::SendMessage, Duration::from_millis(300));
    api.fail_next(Endpoint::SendMessage, ChatError::Http { status: 500, url: "/x".into() });

    let mut script = vec![ms(100)];
    script.extend(submit("lost"));
    script.extend([ms(1000), Step::Close]);
    let view = run(&api, full_page(), script).await;

    let frames = view.frames();
    assert!(frames.iter().any(|f| f.bodies().contains(&"lost")));
    let frame = frames.last().unwrap();
    assert_eq!(frame.bodies(), vec!["r1-1", "r1-2"]);
    assert!(frame.in_flight.is_empty());
}

#[tokio::test(start_paused = true)]
async fn send_outcome_after_switch_leaves_new_room_alone() {
    let api = Arc::new(backend().with_history(1, numbered(1, 1)).with_history(2, numbered(2, 1)));
    api.set_latency(Endpoint::SendMessage, Duration::from_millis(500));

    let mut script = vec![ms(100)];
    script.extend(submit("to general"));
    script.extend([event(ChatEvent::SelectRoom(RoomId(2))), ms(1000), Step::Close]);
    let view = run(&api, full_page(), script).await;

    let frame = view.last_frame().unwrap();
    assert_eq!(frame.active_room, Some(RoomId(2)));
    assert_eq!(frame.bodies(), vec!["r2-1"]);
    assert_eq!(api.history(1).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn provisional_author_follows_session_store() {
    let api = Arc::new(backend());
    let store = MemorySession::with_credential(Some(Credential {
        token: "t".into(),
        user: Some(SessionUser {
            id: 7.into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            role: None,
        }),
    }));
    api.set_latency(Endpoint::SendMessage, Duration::from_millis(10_000));

    let mut script = vec![ms(100)];
    script.extend(submit("first"));
    script.push(ms(100));
    script.extend(submit("second"));
    script.extend([ms(100), Step::Close]);

    let driver = SimDriver::new(script);
    let view = driver.view();
    let runtime = Runtime::new(driver, Arc::clone(&api), full_page()).with_session_store(&store);

    let sign_out = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        store.clear_credential();
    };
    let (result, ()) = tokio::join!(runtime.run(), sign_out);
    result.unwrap();

    let frame = view.last_frame().unwrap();
    let authors: Vec<_> = frame.entries.iter().map(|e| e.author.as_str()).collect();
    assert_eq!(authors, vec!["Ana", "You"]);
}

#[tokio::test(start_paused = true)]
async fn directory_failure_shows_no_rooms() {
    let api = Arc::new(backend());
    api.fail_next(Endpoint::ListRooms, ChatError::Timeout);

    let view = run(&api, ChatConfig::default(), vec![
        ms(100),
        event(ChatEvent::SelectRoom(RoomId(1))),
        ms(100),
        event(ChatEvent::ReloadDirectory),
        ms(100),
        Step::Close,
    ])
    .await;

    let frames = view.frames();
    assert!(frames.iter().any(|f| f.rooms.is_empty() && f.active_room.is_none()));
    let frame = frames.last().unwrap();
    assert_eq!(frame.rooms.len(), 2);
    assert_eq!(frame.active_room, Some(RoomId(1)));
}
