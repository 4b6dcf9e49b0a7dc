//! Integration tests for the Scrawl server: login, join, dispatch and
//! ticking, driven the way a transport would drive them.

use std::time::Duration;

use scrawl::protocol::{Alert, ChatEntry, ChatKind, ClientAction, ParticipantId, ServerEvent, StateView};
use scrawl::room::{PhraseSource, RoomParams, RoundPhase};
use scrawl::tick::TickConfig;
use scrawl::{
    ConfigError, EventReceiver, GameServer, JoinResult, LoginResult, RoomDefinition, ScrawlError,
    ServerConfig, WordListDirectory,
};
use tempfile::TempDir;

// =========================================================================
// Helpers
// =========================================================================

/// A word-list directory plus a server with rooms `lobby` and `attic`.
async fn setup() -> (TempDir, GameServer) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("default.txt"), "apple\n").unwrap();
    std::fs::write(dir.path().join("fruit.txt"), "pear\nplum\n").unwrap();

    let config = ServerConfig {
        word_list_dir: dir.path().to_path_buf(),
        rooms: vec![
            RoomDefinition {
                name: "lobby".into(),
                ..RoomDefinition::default()
            },
            RoomDefinition {
                name: "attic".into(),
                ..RoomDefinition::default()
            },
        ],
        ..ServerConfig::default()
    };
    let server = GameServer::from_config(&config).await.unwrap();
    (dir, server)
}

fn drain(rx: &mut EventReceiver) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Connects and logs in, discarding the login events.
async fn player(server: &GameServer, name: &str) -> (ParticipantId, EventReceiver) {
    let (id, mut rx) = server.connect().await;
    assert_eq!(server.login(id, name).await, LoginResult::LoggedIn);
    drain(&mut rx);
    (id, rx)
}

/// Waits until every command already queued on `room` has been applied.
async fn settle(server: &GameServer, room: &str) {
    server.room_info(room).await.unwrap();
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_sends_me_then_welcome() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = server.connect().await;

    let result = server.login(id, "ann").await;

    assert_eq!(result, LoginResult::LoggedIn);
    assert_eq!(
        drain(&mut rx),
        [
            ServerEvent::Me {
                name: "ann".into(),
                away: false
            },
            ServerEvent::Welcome {
                username: "ann".into()
            },
        ]
    );
    assert_eq!(server.participant_count().await, 1);
}

#[tokio::test]
async fn test_login_name_in_use_ignores_case() {
    let (_dir, server) = setup().await;
    let _ann = player(&server, "Ann").await;
    let (id, mut rx) = server.connect().await;

    let result = server.login(id, "aNN").await;

    assert_eq!(result, LoginResult::NameInUse);
    assert_eq!(
        drain(&mut rx),
        [ServerEvent::Alert(Alert {
            message: "That name is in use.".into(),
            then: Some("connect".into()),
        })]
    );
}

#[tokio::test]
async fn test_login_invalid_name() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = server.connect().await;

    let result = server.login(id, "no spaces!").await;

    assert_eq!(result, LoginResult::InvalidName);
    match drain(&mut rx).as_slice() {
        [ServerEvent::Alert(alert)] => {
            assert!(alert.message.starts_with("You need an alphanumeric name"));
            assert_eq!(alert.then.as_deref(), Some("connect"));
        }
        other => panic!("expected one alert, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_on_unknown_connection() {
    let (_dir, server) = setup().await;
    assert_eq!(
        server.login(ParticipantId(999), "ann").await,
        LoginResult::NotConnected
    );
}

#[tokio::test]
async fn test_login_twice_is_ignored() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = player(&server, "ann").await;

    assert_eq!(server.login(id, "bob").await, LoginResult::AlreadyLoggedIn);
    assert!(drain(&mut rx).is_empty());
}

// =========================================================================
// Join
// =========================================================================

#[tokio::test]
async fn test_join_before_login_is_ignored() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = server.connect().await;

    let result = server.join(id, "lobby").await.unwrap();

    assert_eq!(result, JoinResult::NotLoggedIn);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(server.room_info("lobby").await.unwrap().participant_count, 0);
}

#[tokio::test]
async fn test_join_unknown_room_alerts() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = player(&server, "ann").await;

    let result = server.join(id, "cellar").await.unwrap();

    assert_eq!(result, JoinResult::RoomNotFound);
    assert_eq!(
        drain(&mut rx),
        [ServerEvent::alert("The given room doesn't exist yet.")]
    );
}

#[tokio::test]
async fn test_join_sends_room_state_and_welcome() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = player(&server, "ann").await;

    let result = server.join(id, "lobby").await.unwrap();

    assert_eq!(result, JoinResult::Joined);
    let events = drain(&mut rx);
    assert!(matches!(&events[0], ServerEvent::Room { name, users } if name == "lobby" && users.len() == 1));
    assert_eq!(events[1], ServerEvent::State(StateView::Wait));
    assert_eq!(
        events[2],
        ServerEvent::Chat(ChatEntry::system(
            ChatKind::Info,
            "You've joined room **#lobby** using word list **default**."
        ))
    );
}

#[tokio::test]
async fn test_join_same_room_is_noop() {
    let (_dir, server) = setup().await;
    let (id, mut rx) = player(&server, "ann").await;
    server.join(id, "lobby").await.unwrap();
    drain(&mut rx);

    let result = server.join(id, "lobby").await.unwrap();

    assert_eq!(result, JoinResult::AlreadyInRoom);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_join_other_room_parts_the_first() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;
    let (bob, _bob_rx) = player(&server, "bob").await;
    server.join(ann, "lobby").await.unwrap();
    server.join(bob, "lobby").await.unwrap();
    drain(&mut ann_rx);

    server.join(bob, "attic").await.unwrap();

    assert_eq!(
        drain(&mut ann_rx),
        [ServerEvent::UserPart { name: "bob".into() }]
    );
    assert_eq!(server.room_info("lobby").await.unwrap().participant_count, 1);
    assert_eq!(server.room_info("attic").await.unwrap().participant_count, 1);
}

// =========================================================================
// Dispatch
// =========================================================================

#[tokio::test]
async fn test_say_frame_reaches_the_room() {
    let (_dir, server) = setup().await;
    let (ann, _ann_rx) = player(&server, "ann").await;
    let (bob, mut bob_rx) = player(&server, "bob").await;
    server.join(ann, "lobby").await.unwrap();
    server.join(bob, "lobby").await.unwrap();
    drain(&mut bob_rx);

    server
        .handle_frame(ann, br#"{"action":"say","data":{"msg":"hello"}}"#)
        .await
        .unwrap();
    settle(&server, "lobby").await;

    assert_eq!(
        drain(&mut bob_rx),
        [ServerEvent::Chat(ChatEntry::authored(ChatKind::Chat, "hello", "ann"))]
    );
}

#[tokio::test]
async fn test_blank_say_is_ignored() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;
    server.join(ann, "lobby").await.unwrap();
    drain(&mut ann_rx);

    server
        .handle(ann, ClientAction::Say { msg: "   ".into() })
        .await
        .unwrap();
    settle(&server, "lobby").await;

    assert!(drain(&mut ann_rx).is_empty());
}

#[tokio::test]
async fn test_in_room_actions_outside_a_room_are_ignored() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;

    server
        .handle(ann, ClientAction::Say { msg: "hi".into() })
        .await
        .unwrap();
    server.handle(ann, ClientAction::RequestHint).await.unwrap();
    server.handle(ann, ClientAction::RequestSkip).await.unwrap();

    assert!(drain(&mut ann_rx).is_empty());
}

#[tokio::test]
async fn test_undecodable_frames_are_dropped() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;
    server.join(ann, "lobby").await.unwrap();
    drain(&mut ann_rx);

    server.handle_frame(ann, b"not json").await.unwrap();
    server
        .handle_frame(ann, br#"{"action":"draw","data":"%%%"}"#)
        .await
        .unwrap();
    server.handle_frame(ann, b"").await.unwrap();
    settle(&server, "lobby").await;

    assert!(drain(&mut ann_rx).is_empty());
    assert_eq!(server.room_info("lobby").await.unwrap().participant_count, 1);
}

#[tokio::test]
async fn test_encode_uses_the_wire_format() {
    let (_dir, server) = setup().await;
    let frame = server.encode(&ServerEvent::UserPart { name: "ann".into() }).unwrap();
    assert_eq!(frame, br#"{"event":"user_part","data":{"name":"ann"}}"#);
}

// =========================================================================
// Presence
// =========================================================================

#[tokio::test]
async fn test_set_away_outside_a_room() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;

    server
        .handle(ann, ClientAction::SetAway { away: true })
        .await
        .unwrap();

    assert_eq!(
        drain(&mut ann_rx),
        [ServerEvent::Me {
            name: "ann".into(),
            away: true
        }]
    );
}

#[tokio::test]
async fn test_set_away_inside_a_room_tells_everyone() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;
    let (bob, mut bob_rx) = player(&server, "bob").await;
    server.join(ann, "lobby").await.unwrap();
    server.join(bob, "lobby").await.unwrap();
    drain(&mut ann_rx);
    drain(&mut bob_rx);

    server.set_away(bob, true).await.unwrap();
    settle(&server, "lobby").await;

    assert!(matches!(
        drain(&mut ann_rx).as_slice(),
        [ServerEvent::UserStatus(view)] if view.name == "bob" && view.away
    ));
    assert!(drain(&mut bob_rx).contains(&ServerEvent::Me {
        name: "bob".into(),
        away: true
    }));
    assert_eq!(server.room_info("lobby").await.unwrap().active_count, 1);
}

// =========================================================================
// Disconnect
// =========================================================================

#[tokio::test]
async fn test_disconnect_parts_and_frees_the_name() {
    let (_dir, server) = setup().await;
    let (ann, _ann_rx) = player(&server, "ann").await;
    let (bob, mut bob_rx) = player(&server, "bob").await;
    server.join(ann, "lobby").await.unwrap();
    server.join(bob, "lobby").await.unwrap();
    drain(&mut bob_rx);

    server.disconnect(ann).await;

    assert_eq!(
        drain(&mut bob_rx),
        [ServerEvent::UserPart { name: "ann".into() }]
    );
    assert_eq!(server.participant_count().await, 1);
    let (again, _rx) = server.connect().await;
    assert_eq!(server.login(again, "ANN").await, LoginResult::LoggedIn);
}

#[tokio::test]
async fn test_disconnect_before_login() {
    let (_dir, server) = setup().await;
    let (id, _rx) = server.connect().await;

    server.disconnect(id).await;

    assert_eq!(server.login(id, "ann").await, LoginResult::NotConnected);
}

// =========================================================================
// Word lists and configuration
// =========================================================================

#[tokio::test]
async fn test_set_word_list_swaps_and_announces() {
    let (_dir, server) = setup().await;
    let (ann, mut ann_rx) = player(&server, "ann").await;
    server.join(ann, "lobby").await.unwrap();
    drain(&mut ann_rx);

    server.set_word_list("lobby", "fruit").await.unwrap();
    settle(&server, "lobby").await;

    assert_eq!(server.room_info("lobby").await.unwrap().word_list, "fruit");
    assert_eq!(
        drain(&mut ann_rx),
        [ServerEvent::Chat(ChatEntry::system(
            ChatKind::Info,
            "The word list is now **fruit**."
        ))]
    );
}

#[tokio::test]
async fn test_set_word_list_unknown_list() {
    let (_dir, server) = setup().await;

    let result = server.set_word_list("lobby", "vegetables").await;

    assert!(matches!(
        result,
        Err(ScrawlError::Config(ConfigError::UnknownWordList(_)))
    ));
    assert_eq!(server.room_info("lobby").await.unwrap().word_list, "default");
}

#[tokio::test]
async fn test_from_config_with_missing_word_list_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        word_list_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    };

    let result = GameServer::from_config(&config).await;

    assert!(matches!(
        result,
        Err(ScrawlError::Config(ConfigError::UnknownWordList(_)))
    ));
}

#[tokio::test]
async fn test_from_config_loads_a_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("animals.txt"), "otter\n").unwrap();
    let path = dir.path().join("scrawl.json");
    let json = serde_json::json!({
        "word_list_dir": dir.path(),
        "rooms": [ { "name": "zoo", "word_list": "animals", "round_limit": 3 } ]
    });
    std::fs::write(&path, json.to_string()).unwrap();

    let config = ServerConfig::load_from(&path).unwrap();
    let server = GameServer::from_config(&config).await.unwrap();

    assert_eq!(server.room_names().await, ["zoo"]);
    assert_eq!(server.room_info("zoo").await.unwrap().word_list, "animals");
    assert_eq!(config.rooms[0].params.round_limit, 3);
}

// =========================================================================
// Ticker
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_ticker_starts_rounds() {
    let (_dir, server) = setup().await;
    let (ann, _ann_rx) = player(&server, "ann").await;
    let (bob, _bob_rx) = player(&server, "bob").await;
    server.join(ann, "lobby").await.unwrap();
    server.join(bob, "lobby").await.unwrap();

    let _ticker = server.spawn_ticker(TickConfig::with_rate(2));
    for _ in 0..20 {
        if server.room_info("lobby").await.unwrap().phase == RoundPhase::Round {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let lobby = server.room_info("lobby").await.unwrap();
    assert_eq!(lobby.phase, RoundPhase::Round);
    assert_eq!(lobby.round, 1);
    assert_eq!(server.room_info("attic").await.unwrap().phase, RoundPhase::Waiting);
}

#[tokio::test]
async fn test_ticker_with_zero_rate_exits() {
    let (_dir, server) = setup().await;

    let ticker = server.spawn_ticker(TickConfig::with_rate(0));

    ticker.await.unwrap();
}

/// Always "pear". Optionally reports the first call, then blocks its
/// thread until released.
struct Gated {
    entered: Option<tokio::sync::oneshot::Sender<()>>,
    release: Option<std::sync::mpsc::Receiver<()>>,
}

impl Gated {
    fn open() -> Self {
        Self {
            entered: None,
            release: None,
        }
    }

    fn closed() -> (
        Self,
        tokio::sync::oneshot::Receiver<()>,
        std::sync::mpsc::Sender<()>,
    ) {
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let gated = Self {
            entered: Some(entered_tx),
            release: Some(release_rx),
        };
        (gated, entered_rx, release_tx)
    }
}

impl PhraseSource for Gated {
    fn name(&self) -> &str {
        "gated"
    }

    fn next_phrase(&mut self) -> String {
        if let Some(entered) = self.entered.take() {
            let _ = entered.send(());
        }
        if let Some(release) = self.release.take() {
            let _ = release.recv();
        }
        "pear".to_string()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blocked_room_does_not_stall_other_rooms() {
    let dir = tempfile::tempdir().unwrap();
    let server = GameServer::new(WordListDirectory::new(dir.path()));
    let quick = RoomParams {
        round_limit: 1000,
        round_time: Duration::from_millis(100),
        ..RoomParams::default()
    };
    let (gated, entered, release) = Gated::closed();
    server
        .create_room("fast", Box::new(Gated::open()), quick)
        .await
        .unwrap();
    server
        .create_room("slow", Box::new(gated), RoomParams::default())
        .await
        .unwrap();
    for (name, room) in [("ann", "fast"), ("bob", "fast"), ("cat", "slow"), ("dan", "slow")] {
        let (id, _rx) = player(&server, name).await;
        server.join(id, room).await.unwrap();
    }

    let _ticker = server.spawn_ticker(TickConfig::with_rate(20));
    // The slow room's actor is now stuck choosing its first phrase.
    tokio::time::timeout(Duration::from_secs(5), entered)
        .await
        .unwrap()
        .unwrap();

    let (eve, _eve_rx) = player(&server, "eve").await;
    let joining = tokio::spawn({
        let server = server.clone();
        async move { server.join(eve, "slow").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let before = server.room_info("fast").await.unwrap().round;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let after = server.room_info("fast").await.unwrap().round;
    let fay = tokio::time::timeout(Duration::from_secs(1), player(&server, "fay")).await;

    release.send(()).unwrap();
    let joined = tokio::time::timeout(Duration::from_secs(5), joining)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(after >= before + 3, "fast room went from round {before} to {after}");
    assert!(fay.is_ok(), "login stalled behind the slow room");
    assert_eq!(joined, JoinResult::Joined);
    assert_eq!(server.room_info("slow").await.unwrap().participant_count, 3);
}
