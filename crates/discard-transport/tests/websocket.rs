//! WebSocket connection tests against a local axum server.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use discard_protocol::{codec, InboundFrame, OutboundFrame};
use discard_transport::{Connection, ConnectionState, WebSocketConnector, WEBSOCKET_PATH};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// Start a fake chat server. Every text frame it receives is forwarded to
/// the returned receiver.
async fn spawn_server() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route(WEBSOCKET_PATH, get(ws_handler))
        .with_state(seen_tx);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, seen_rx)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(seen): State<mpsc::UnboundedSender<String>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, seen))
}

async fn handle_socket(mut socket: WebSocket, seen: mpsc::UnboundedSender<String>) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let _ = seen.send(text.clone());

        let reply = match serde_json::from_str::<OutboundFrame>(&text) {
            Ok(OutboundFrame::PresenceRequest) => InboundFrame::presence_list(["alice", "bob"]),
            Ok(OutboundFrame::Subscribe { channel_id }) => InboundFrame::message(
                discard_protocol::ChatMessage::new(channel_id, "welcome").with_id("m1"),
            ),
            Ok(OutboundFrame::Unsubscribe { .. }) => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            _ => continue,
        };

        let reply = serde_json::to_string(&reply).unwrap();
        if socket.send(Message::Text(reply)).await.is_err() {
            return;
        }
    }
}

async fn wait_for_state(conn: &impl Connection, target: ConnectionState) {
    let mut states = conn.watch_state();
    let reached = timeout(WAIT, states.wait_for(|s| *s == target))
        .await
        .expect("timed out waiting for state")
        .is_ok();
    assert!(reached);
}

#[tokio::test]
async fn test_open_requests_presence_first() {
    let (addr, mut seen) = spawn_server().await;
    let connector = WebSocketConnector::from_origin(&format!("http://{addr}")).unwrap();
    let mut conn = connector.connect();

    let first = timeout(WAIT, seen.recv()).await.unwrap().unwrap();
    assert_eq!(first, r#"{"type":"presence_request"}"#);

    let reply = timeout(WAIT, conn.recv()).await.unwrap().unwrap();
    assert_eq!(codec::decode(&reply), InboundFrame::presence_list(["alice", "bob"]));
    assert_eq!(conn.state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_subscribe_round_trip() {
    let (addr, mut seen) = spawn_server().await;
    let connector = WebSocketConnector::from_origin(&format!("http://{addr}")).unwrap();
    let mut conn = connector.connect();
    wait_for_state(&conn, ConnectionState::Open).await;

    conn.send(&OutboundFrame::subscribe("general")).unwrap();

    // presence_list, then the welcome message
    let _presence = timeout(WAIT, conn.recv()).await.unwrap().unwrap();
    let welcome = timeout(WAIT, conn.recv()).await.unwrap().unwrap();
    match codec::decode(&welcome) {
        InboundFrame::Message { message } => {
            assert_eq!(message.channel_id, "general");
            assert_eq!(message.content, "welcome");
        }
        other => panic!("Expected message frame, got {:?}", other),
    }

    let frames: Vec<String> = std::iter::from_fn(|| seen.try_recv().ok()).collect();
    assert_eq!(
        frames,
        vec![
            r#"{"type":"presence_request"}"#.to_string(),
            r#"{"type":"subscribe","channel_id":"general"}"#.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_server_close_is_a_state_transition() {
    let (addr, _seen) = spawn_server().await;
    let connector = WebSocketConnector::from_origin(&format!("http://{addr}")).unwrap();
    let mut conn = connector.connect();
    wait_for_state(&conn, ConnectionState::Open).await;

    conn.send(&OutboundFrame::unsubscribe("general")).unwrap();
    wait_for_state(&conn, ConnectionState::Closed).await;

    // Anything buffered before the close is still delivered, then the end.
    while timeout(WAIT, conn.recv()).await.unwrap().is_some() {}
    assert!(matches!(
        conn.send(&OutboundFrame::subscribe("general")),
        Err(discard_transport::TransportError::NotOpen)
    ));
}

#[tokio::test]
async fn test_client_close() {
    let (addr, _seen) = spawn_server().await;
    let connector = WebSocketConnector::from_origin(&format!("http://{addr}")).unwrap();
    let mut conn = connector.connect();
    wait_for_state(&conn, ConnectionState::Open).await;

    conn.close();
    wait_for_state(&conn, ConnectionState::Closed).await;
    while timeout(WAIT, conn.recv()).await.unwrap().is_some() {}
}
