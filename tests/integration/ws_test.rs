//! Integration tests for WebSocket connection and broadcasting.

mod helpers;

use std::time::Duration;

use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;

use relay_core::config::AppConfig;

use helpers::{TestApp, TestServer, assert_silent, expect_closed, recv_text, send_text};

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_connect_broadcast_disconnect_scenario() {
    let server = TestServer::start().await;

    let mut a = server.connect().await;
    let mut b = server.connect().await;
    server.wait_for_connections(2).await;
    assert_silent(&mut a, QUIET).await;

    send_text(&mut a, "hi").await;
    assert_eq!(recv_text(&mut a).await, "Echo: hi");
    assert_eq!(recv_text(&mut b).await, "Echo: hi");

    b.close(None).await.expect("close b");
    server.wait_for_connections(1).await;

    send_text(&mut a, "bye").await;
    assert_eq!(recv_text(&mut a).await, "Echo: bye");
    assert_silent(&mut a, QUIET).await;
    assert_eq!(server.connection_count(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_upgrade_accepted_on_any_path() {
    let server = TestServer::start().await;

    let mut root = server.connect().await;
    let mut ws_path = server.connect_raw("/ws").await;
    let mut other = server.connect_raw("/some/room").await;
    assert_eq!(recv_text(&mut ws_path).await, helpers::WELCOME);
    assert_eq!(recv_text(&mut other).await, helpers::WELCOME);
    server.wait_for_connections(3).await;

    send_text(&mut other, "from other").await;
    for ws in [&mut root, &mut ws_path, &mut other] {
        assert_eq!(recv_text(ws).await, "Echo: from other");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_sender_order_preserved_for_every_recipient() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    server.wait_for_connections(2).await;

    for i in 0..20 {
        send_text(&mut a, &format!("m{i}")).await;
    }

    for ws in [&mut a, &mut b] {
        for i in 0..20 {
            assert_eq!(recv_text(ws).await, format!("Echo: m{i}"));
        }
    }

    server.stop().await;
}

#[tokio::test]
async fn test_binary_frame_relayed_as_text() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;

    a.send(Message::Binary(b"xin chao".to_vec().into()))
        .await
        .expect("send binary");
    assert_eq!(recv_text(&mut a).await, "Echo: xin chao");

    a.send(Message::Binary(vec![b'x', 0xff, 0xfe].into()))
        .await
        .expect("send invalid utf-8");
    assert_eq!(recv_text(&mut a).await, "Echo: x\u{FFFD}\u{FFFD}");
    assert_eq!(server.connection_count(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_handshake_rejected_at_capacity() {
    let mut config = AppConfig::default();
    config.realtime.max_connections = 1;
    let server = TestServer::start_with(config).await;

    let mut first = server.connect().await;
    server.wait_for_connections(1).await;

    let rejected = tokio_tungstenite::connect_async(server.ws_url("/")).await;
    assert_eq!(rejection_status(rejected), 503);
    assert_eq!(server.connection_count(), 1);

    // The admitted connection is unaffected.
    send_text(&mut first, "still here").await;
    assert_eq!(recv_text(&mut first).await, "Echo: still here");

    let health = server.state.realtime.metrics.snapshot();
    assert_eq!(health.connections_rejected, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_stalled_peer_dropped_after_send_timeout() {
    let mut config = AppConfig::default();
    config.realtime.send_timeout_ms = 1000;
    let server = TestServer::start_with(config).await;

    let mut a = server.connect().await;
    // Never read; its socket buffers fill once enough data is relayed.
    let _stalled = server.connect_raw("/").await;
    server.wait_for_connections(2).await;

    let big = "x".repeat(8 * 1024 * 1024);
    let expected = format!("Echo: {big}");
    for _ in 0..4 {
        send_text(&mut a, &big).await;
        assert!(recv_text(&mut a).await == expected);
    }

    server.wait_for_connections(1).await;
    assert_eq!(server.state.realtime.metrics.snapshot().connections_closed, 1);

    send_text(&mut a, "still here").await;
    assert_eq!(recv_text(&mut a).await, "Echo: still here");

    server.stop().await;
}

#[tokio::test]
async fn test_handshake_rejected_while_shutting_down() {
    let server = TestServer::start().await;
    server.state.realtime.shutdown();

    let rejected = tokio_tungstenite::connect_async(server.ws_url("/")).await;

    assert_eq!(rejection_status(rejected), 503);
    assert_eq!(server.connection_count(), 0);
    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_all_connections() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    server.wait_for_connections(2).await;
    let state = server.state.clone();

    server.stop().await;

    expect_closed(&mut a).await;
    expect_closed(&mut b).await;
    assert_eq!(state.realtime.hub.connection_count(), 0);
    assert!(state.realtime.is_shutting_down());
}

#[tokio::test]
async fn test_ws_path_without_upgrade_is_rejected() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws").await;

    assert!(
        response.status.is_client_error(),
        "Expected a 4xx, got {}",
        response.status
    );
}

fn rejection_status<T>(result: Result<T, tokio_tungstenite::tungstenite::Error>) -> u16 {
    match result {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("expected HTTP rejection, got {other}"),
        Ok(_) => panic!("handshake should be refused"),
    }
}
