//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

use relay_api::AppState;
use relay_api::handlers::static_page::StaticPage;
use relay_core::config::AppConfig;
use relay_core::result::AppResult;

pub const WELCOME: &str = "Chào từ server WebSocket!";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Captured HTTP response
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

/// Router-only application for plain HTTP requests
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config, StaticPage::builtin());
        let router = relay_api::build_app(state.clone());
        Self { router, state }
    }

    /// Send a request through the router
    pub async fn request(&self, method: &str, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        TestResponse {
            status,
            content_type,
            body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
        }
    }
}

/// Relay bound to an ephemeral local port
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<AppResult<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(AppConfig::default()).await
    }

    pub async fn start_with(config: AppConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let state = AppState::new(config, StaticPage::builtin());
        let (tx, rx) = oneshot::channel();

        let task = tokio::spawn(relay_api::serve(listener, state.clone(), async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            state,
            shutdown: Some(tx),
            task,
        }
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Connect to `/` and consume the welcome message
    pub async fn connect(&self) -> WsStream {
        let mut ws = self.connect_raw("/").await;
        assert_eq!(recv_text(&mut ws).await, WELCOME);
        ws
    }

    pub async fn connect_raw(&self, path: &str) -> WsStream {
        let (ws, _) = timeout(TIMEOUT, connect_async(self.ws_url(path)))
            .await
            .expect("connect timed out")
            .expect("connect");
        ws
    }

    pub fn connection_count(&self) -> usize {
        self.state.realtime.hub.connection_count()
    }

    /// Poll until the hub reports `expected` connections
    pub async fn wait_for_connections(&self, expected: usize) {
        timeout(TIMEOUT, async {
            while self.connection_count() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {expected} connections, have {}",
                self.connection_count()
            )
        });
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(TIMEOUT, &mut self.task)
            .await
            .expect("server did not stop")
            .expect("server task")
            .expect("server result");
    }
}

pub async fn send_text(ws: &mut WsStream, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("send");
}

/// Next text frame, skipping control frames
pub async fn recv_text(ws: &mut WsStream) -> String {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("no message within timeout")
            .expect("stream ended")
            .expect("read error");
        match msg {
            Message::Text(text) => return text.as_str().to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert nothing but control frames arrive within `window`
pub async fn assert_silent(ws: &mut WsStream, window: Duration) {
    if let Ok(Some(Ok(msg))) = timeout(window, ws.next()).await {
        assert!(
            !msg.is_text() && !msg.is_binary(),
            "unexpected message: {msg:?}"
        );
    }
}

/// Wait for the server to close the socket
pub async fn expect_closed(ws: &mut WsStream) {
    timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("socket was not closed");
}
