// Tests for the media stream WebSocket transport
//
// These tests serve a real axum WebSocket route and drive it with a
// tokio-tungstenite client, checking envelope delivery and that the
// stream is closed exactly once.

use axum::extract::ws::WebSocketUpgrade;
use axum::routing::get;
use axum::Router;
use call_bridge::media::{MediaEnvelope, WebSocketTransport};
use call_bridge::MediaTransport;
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Serve `/media`, handing each upgraded socket to `on_socket`
async fn spawn_media_server<F, Fut>(on_socket: F) -> String
where
    F: Fn(WebSocketTransport) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let app = Router::new().route(
        "/media",
        get(move |ws: WebSocketUpgrade| {
            let on_socket = on_socket.clone();
            async move { ws.on_upgrade(move |socket| on_socket(WebSocketTransport::new(socket))) }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{}/media", addr)
}

#[derive(Debug)]
struct ServerView {
    messages: Vec<String>,
    closed_by_peer: bool,
    close_result_ok: bool,
}

#[tokio::test]
async fn test_peer_close_ends_stream_and_close_is_noop() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_media_server(move |mut transport| {
        let tx = tx.clone();
        async move {
            let mut messages = Vec::new();
            while let Some(message) = transport.next_message().await {
                messages.push(message.unwrap());
            }
            let closed_by_peer = transport.is_closed();
            let close_result_ok = transport.close().await.is_ok();
            let _ = tx.send(ServerView {
                messages,
                closed_by_peer,
                close_result_ok,
            });
        }
    })
    .await;

    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    client
        .send(WsMessage::Text(r#"{"event":"stop"}"#.into()))
        .await
        .unwrap();
    client
        .send(WsMessage::Binary(br#"{"event":"mark"}"#.to_vec().into()))
        .await
        .unwrap();
    client
        .send(WsMessage::Binary(vec![0xff, b'{'].into()))
        .await
        .unwrap();
    client.close(None).await.unwrap();

    let view = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(view.messages.len(), 3);
    assert_eq!(view.messages[0], r#"{"event":"stop"}"#);
    assert_eq!(view.messages[1], r#"{"event":"mark"}"#, "Binary UTF-8 is passed through");
    assert!(
        MediaEnvelope::decode(&view.messages[2]).is_err(),
        "Non-UTF-8 bytes surface as a decode failure"
    );
    assert!(view.closed_by_peer);
    assert!(view.close_result_ok);
}

#[tokio::test]
async fn test_server_close_sends_one_close_frame() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_media_server(move |mut transport| {
        let tx = tx.clone();
        async move {
            let first = transport.next_message().await.map(|m| m.unwrap());
            let first_close = transport.close().await.is_ok();
            let second_close = transport.close().await.is_ok();
            let _ = tx.send((first, first_close, second_close, transport.is_closed()));
        }
    })
    .await;

    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    client
        .send(WsMessage::Text(r#"{"event":"connected"}"#.into()))
        .await
        .unwrap();

    let mut close_frames = 0;
    while let Ok(Some(frame)) = tokio::time::timeout(Duration::from_secs(2), client.next()).await {
        match frame {
            Ok(WsMessage::Close(_)) => close_frames += 1,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    let (first, first_close, second_close, closed) = rx.recv().await.unwrap();
    assert_eq!(first.as_deref(), Some(r#"{"event":"connected"}"#));
    assert!(first_close);
    assert!(second_close, "Second close is a no-op");
    assert!(closed);
    assert_eq!(close_frames, 1);
}
