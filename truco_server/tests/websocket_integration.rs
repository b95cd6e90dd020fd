//! End-to-end WebSocket tests against a server bound to an ephemeral port.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use truco::room::{RoomConfig, RoomManager};
use truco_server::api::{AppState, create_router};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FAST: Duration = Duration::from_millis(5);

async fn spawn_server() -> SocketAddr {
    let template = RoomConfig {
        bot_delay: FAST,
        round_end_delay: FAST,
        game_end_delay: FAST,
        dealer_delay: FAST,
        seed: Some(7),
        ..RoomConfig::default()
    };
    let app = create_router(AppState::new(RoomManager::new(template, 16)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, message: Value) {
    socket.send(Message::text(message.to_string())).await.unwrap();
}

/// Next JSON message, failing the test after a few seconds of silence.
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("server went quiet")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip messages until one of type `kind` arrives.
async fn recv_type(socket: &mut Socket, kind: &str) -> Value {
    loop {
        let message = recv(socket).await;
        if message["type"] == kind {
            return message;
        }
    }
}

/// Messages that arrive within `window`.
async fn drain_for(socket: &mut Socket, window: Duration) -> Vec<Value> {
    let mut out = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Some(Ok(frame))) = tokio::time::timeout_at(deadline, socket.next()).await {
        if let Message::Text(text) = frame {
            out.push(serde_json::from_str(text.as_str()).unwrap());
        }
    }
    out
}

async fn create_room(socket: &mut Socket, game: &str) -> String {
    send(socket, json!({"type": "createRoom", "gameType": game, "name": "host"})).await;
    let created = recv_type(socket, "roomCreated").await;
    assert_eq!(created["isHost"], true);
    assert_eq!(created["gameType"], game);
    created["roomId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_and_join_over_the_wire() {
    let addr = spawn_server().await;
    let mut host = connect(addr).await;
    let code = create_room(&mut host, "truco").await;
    assert_eq!(code.len(), 6);

    let mut guest = connect(addr).await;
    send(
        &mut guest,
        json!({"type": "joinRoom", "roomCode": code.to_lowercase(), "name": "bea"}),
    )
    .await;
    let joined = recv_type(&mut guest, "roomJoined").await;
    assert_eq!(joined["roomId"], code);
    assert_eq!(joined["playerIndex"], 1);

    let heard = recv_type(&mut host, "playerJoined").await;
    assert_eq!(heard["player"]["name"], "bea");
    assert_eq!(heard["playerCount"], 2);

    // Dropping the guest's socket counts as leaving.
    drop(guest);
    let left = recv_type(&mut host, "playerLeft").await;
    assert_eq!(left["playerCount"], 1);
}

#[tokio::test]
async fn test_errors_reach_only_the_sender() {
    let addr = spawn_server().await;
    let mut host = connect(addr).await;
    let code = create_room(&mut host, "truco").await;

    let mut guest = connect(addr).await;
    send(&mut guest, json!({"type": "joinRoom", "roomCode": code})).await;
    recv_type(&mut guest, "roomJoined").await;
    drain_for(&mut host, Duration::from_millis(100)).await;

    send(&mut guest, json!({"type": "startGame"})).await;
    let refused = recv_type(&mut guest, "roomError").await;
    assert!(refused["message"].as_str().unwrap().contains("host"));

    send(&mut guest, json!({"type": "addBot", "roomId": "ELSEWHERE"})).await;
    let mismatch = recv_type(&mut guest, "error").await;
    assert!(mismatch["message"].as_str().unwrap().contains("ELSEWHERE"));

    let heard = drain_for(&mut host, Duration::from_millis(200)).await;
    assert!(
        heard.iter().all(|m| m["type"] != "roomError" && m["type"] != "error"),
        "{heard:?}"
    );
}

#[tokio::test]
async fn test_malformed_frames_get_an_error() {
    let addr = spawn_server().await;
    let mut socket = connect(addr).await;

    send(&mut socket, json!({"type": "fold"})).await;
    let error = recv(&mut socket).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().starts_with("malformed message"));

    send(&mut socket, json!({"type": "playCard", "cardIndex": 0})).await;
    let error = recv(&mut socket).await;
    assert_eq!(error["type"], "roomError");
}

#[tokio::test]
async fn test_flooding_hits_the_rate_limit() {
    let addr = spawn_server().await;
    let mut socket = connect(addr).await;
    for _ in 0..15 {
        send(&mut socket, json!({"type": "getState"})).await;
    }
    let replies = drain_for(&mut socket, Duration::from_millis(300)).await;
    assert_eq!(replies.len(), 15);
    let limited = replies
        .iter()
        .filter(|m| m["message"].as_str().is_some_and(|s| s.contains("rate limit")))
        .count();
    assert_eq!(limited, 5);
}

#[tokio::test]
async fn test_truco_hand_with_three_bots() {
    let addr = spawn_server().await;
    let mut host = connect(addr).await;
    create_room(&mut host, "truco").await;

    for _ in 0..3 {
        send(&mut host, json!({"type": "addBot"})).await;
    }
    send(&mut host, json!({"type": "startGame"})).await;
    let started = recv_type(&mut host, "gameStarted").await;
    assert_eq!(started["localPlayerIndex"], 0);
    assert_eq!(started["players"].as_array().map(Vec::len), Some(4));

    let mut sent = 0;
    loop {
        let message = recv(&mut host).await;
        match message["type"].as_str() {
            Some("state") => {
                let view = &message["view"];
                let details = &view["details"];
                let reply = if !details["trucoState"].is_null() {
                    (details["responder"] == 0)
                        .then(|| json!({"type": "respondTruco", "response": 1}))
                } else if view["currentPlayer"] == 0 && view["phase"] == "playing" {
                    Some(json!({"type": "playCard", "cardIndex": 0}))
                } else {
                    None
                };
                if let Some(reply) = reply {
                    send(&mut host, reply).await;
                    sent += 1;
                    // Our own seat sees its hand, the others only sizes.
                    for player in view["players"].as_array().unwrap() {
                        assert_eq!(player["hand"].is_array(), player["seat"] == 0);
                    }
                }
            }
            Some("gameEnd") => {
                let games = &message["games"];
                assert!(games[0].as_u64().unwrap() + games[1].as_u64().unwrap() <= 12);
                break;
            }
            Some("error") => panic!("rejected: {message}"),
            _ => {}
        }
        assert!(sent < 50, "hand never ended");
    }
}
