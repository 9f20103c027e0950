mod support;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pong_multiplayer::{
    config::Config,
    geometry::Side,
    level::Level,
    network::{fetch_sessions, Endpoint, Link, NetError, NetworkClient, NetworkEvent},
    protocol::{PlayerInfo, PlayerInput},
};
use tokio::{sync::oneshot, time::timeout};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{protocol::frame::coding::CloseCode, Message},
};

fn player_info() -> PlayerInfo {
    PlayerInfo {
        player_name: "ada".to_string(),
        level: Level::Medium,
        screen_width: 640,
        screen_height: 480,
        max_score: 5,
    }
}

async fn next_event(link: &mut Link) -> NetworkEvent {
    timeout(Duration::from_secs(5), link.events.recv())
        .await
        .expect("event in time")
        .expect("receive loop still running")
}

#[tokio::test]
async fn multiplayer_registers_then_streams_state() {
    let (listener, addr) = support::listen().await;
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();

        let registration = ws.next().await.unwrap().unwrap();
        let ready = serde_json::json!({
            "ready": true, "name": "ada", "opponent_name": "grace", "side": 2
        });
        ws.send(Message::text(ready.to_string())).await.unwrap();
        ws.send(Message::text(support::state_json(40.0, 300.0, (1, 2), false)))
            .await
            .unwrap();
        // keep the socket open until the client goes away
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
        registration.into_text().unwrap().to_string()
    });

    let config = support::local_config(&addr.to_string());
    let mut link = Link::multiplayer(&config, &player_info()).await.unwrap();

    match next_event(&mut link).await {
        NetworkEvent::Ready(ready) => {
            assert_eq!(ready.side, Side::Left);
            assert_eq!(ready.opponent_name, "grace");
        }
        other => panic!("expected ready, got {other:?}"),
    }
    match next_event(&mut link).await {
        NetworkEvent::State(state) => {
            assert_eq!(state.current_player.position_y, 40.0);
            assert_eq!(state.opponent_player.score, 2);
            assert_eq!(state.ball.bounces, 2);
        }
        other => panic!("expected state, got {other:?}"),
    }

    link.client.close().await;
    assert!(link.client.is_closed());

    let registration: serde_json::Value =
        serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(registration["player_name"], "ada");
    assert_eq!(registration["level"], 1);
    assert_eq!(registration["max_score"], 5);
    assert_eq!(registration["screen_width"], serde_json::json!(640));
    assert_eq!(registration["screen_height"], serde_json::json!(480));
}

#[tokio::test]
async fn spectate_request_names_the_session() {
    let (listener, addr) = support::listen().await;
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let request = ws.next().await.unwrap().unwrap();
        ws.close(None).await.unwrap();
        request.into_text().unwrap().to_string()
    });

    let config = support::local_config(&addr.to_string());
    let mut link = Link::spectate(&config, "abc-123").await.unwrap();

    let request: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(request, serde_json::json!({"session_id": "abc-123"}));

    assert!(matches!(
        next_event(&mut link).await,
        NetworkEvent::Failed(NetError::Closed)
    ));
}

#[tokio::test]
async fn idle_input_stays_off_the_wire() {
    let (listener, addr) = support::listen().await;
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let first = ws.next().await.unwrap().unwrap();
        first.into_text().unwrap().to_string()
    });

    let config = support::local_config(&addr.to_string());
    let mut client = NetworkClient::connect(&config, Endpoint::Multiplayer)
        .await
        .unwrap();
    client.send_player_input(PlayerInput::default()).await.unwrap();
    client
        .send_player_input(PlayerInput {
            up: false,
            down: true,
        })
        .await
        .unwrap();

    let first: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(first, serde_json::json!({"up": false, "down": true}));

    client.close().await;
    assert!(matches!(
        client.send_player_input(PlayerInput { up: true, down: false }).await,
        Err(NetError::NotConnected)
    ));
}

#[tokio::test]
async fn malformed_message_fails_the_link() {
    let (listener, addr) = support::listen().await;
    let (done_tx, done_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let _registration = ws.next().await;
        ws.send(Message::text("{not json")).await.unwrap();
        let _ = done_rx.await;
    });

    let config = support::local_config(&addr.to_string());
    let mut link = Link::multiplayer(&config, &player_info()).await.unwrap();

    assert!(matches!(
        next_event(&mut link).await,
        NetworkEvent::Failed(NetError::Decode(_))
    ));
    // the failure is always the last event
    assert!(link.events.recv().await.is_none());
    let _ = done_tx.send(());
}

#[tokio::test]
async fn read_deadline_starts_with_the_first_message() {
    let (listener, addr) = support::listen().await;
    let (done_tx, done_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let _registration = ws.next().await;
        // waiting for an opponent takes longer than the read timeout
        tokio::time::sleep(Duration::from_millis(300)).await;
        ws.send(Message::text(support::state_json(0.0, 0.0, (0, 0), false)))
            .await
            .unwrap();
        let _ = done_rx.await;
    });

    let config = Config {
        read_timeout: Duration::from_millis(100),
        ..support::local_config(&addr.to_string())
    };
    let mut link = Link::multiplayer(&config, &player_info()).await.unwrap();

    assert!(matches!(next_event(&mut link).await, NetworkEvent::State(_)));
    assert!(matches!(
        next_event(&mut link).await,
        NetworkEvent::Failed(NetError::ReadTimeout)
    ));
    let _ = done_tx.send(());
}

#[tokio::test]
async fn close_sends_a_normal_close_frame() {
    let (listener, addr) = support::listen().await;
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Close(frame) = msg {
                return frame.map(|f| f.code);
            }
        }
        None
    });

    let config = support::local_config(&addr.to_string());
    let mut link = Link::spectate(&config, "s1").await.unwrap();
    link.client.close().await;
    // a second close is a no-op
    link.client.close().await;

    assert_eq!(server.await.unwrap(), Some(CloseCode::Normal));
    // cancelling the receive loop drops its sender
    let end = timeout(Duration::from_secs(5), link.events.recv()).await.unwrap();
    assert!(end.is_none());
}

#[tokio::test]
async fn dial_errors_are_reported() {
    let (listener, addr) = support::listen().await;
    drop(listener);

    let config = support::local_config(&addr.to_string());
    let result = NetworkClient::connect(&config, Endpoint::Multiplayer).await;
    assert!(matches!(result, Err(NetError::Dial(_))));
}

#[tokio::test]
async fn sessions_are_listed() {
    let (listener, addr) = support::listen().await;
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        assert!(support::requests_path(&tcp, "/sessions").await);
        support::answer_http(
            tcp,
            "200 OK",
            r#"[{"id":"s1","player1":"ada","player2":"grace"}]"#,
        )
        .await;
    });

    let config = support::local_config(&addr.to_string());
    let sessions = fetch_sessions(&config).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "s1");
    assert_eq!(sessions[0].player2, "grace");
}

#[tokio::test]
async fn session_listing_rejects_other_statuses() {
    let (listener, addr) = support::listen().await;
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        support::answer_http(tcp, "500 Internal Server Error", "{}").await;
    });

    let config = support::local_config(&addr.to_string());
    assert!(matches!(
        fetch_sessions(&config).await,
        Err(NetError::HttpStatus(500))
    ));
}
