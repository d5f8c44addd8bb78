use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::accept_async;
use tungstenite::Message;
use tracing::{debug, info, warn};

use crate::state::{ServerMessage, SharedSessionState};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Key { code: String, pressed: bool },
    Blur,
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        match serde_json::from_str(txt) {
            Ok(msg) => Some(msg),
            Err(err) => {
                debug!(%err, "ignoring malformed client message");
                None
            }
        }
    }
}

pub async fn serve(listener: TcpListener, state: Arc<Mutex<SharedSessionState>>, zoom: f32) {
    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        tokio::spawn(handle_client(raw, peer, Arc::clone(&state), zoom));
    }
}

async fn handle_client(raw: TcpStream, peer: SocketAddr, state: Arc<Mutex<SharedSessionState>>, zoom: f32) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, %err, "websocket handshake failed");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // outgoing channel: the tick loop and this task both push into it
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let client_id = {
        let mut session = state.lock().await;
        let id = session.register_client(tx);
        session.send_to(&id, &ServerMessage::Welcome { client_id: id, zoom });
        id
    };
    info!(client = %client_id, %peer, "client connected");

    let send_loop = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(err) => {
                debug!(client = %client_id, %err, "websocket read error");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let Some(parsed) = ClientMessage::from_json(&text) else {
            continue;
        };

        let mut session = state.lock().await;
        match parsed {
            ClientMessage::Key { code, pressed } => {
                if !session.input.handle_key(&code, pressed) {
                    debug!(client = %client_id, code = %code, "unbound key");
                }
            }
            ClientMessage::Blur => session.input.clear(),
            ClientMessage::Ping => session.send_to(&client_id, &ServerMessage::Pong),
        }
    }

    state.lock().await.remove_client(&client_id);
    send_loop.abort();
    info!(client = %client_id, "client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_blur_and_ping() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"key","code":"KeyW","pressed":true}"#),
            Some(ClientMessage::Key { code: "KeyW".to_string(), pressed: true })
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"blur"}"#), Some(ClientMessage::Blur));
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
    }

    #[test]
    fn rejects_unknown_or_incomplete_messages() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"input","throttle":1.0}"#), None);
        assert_eq!(ClientMessage::from_json(r#"{"type":"key","code":"KeyW"}"#), None);
        assert_eq!(ClientMessage::from_json("not json"), None);
    }

    #[tokio::test]
    async fn key_messages_drive_the_shared_input() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let state = Arc::new(Mutex::new(SharedSessionState::new()));
        tokio::spawn(serve(listener, Arc::clone(&state), 43.0));

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}")).await.expect("connect");

        let welcome = ws.next().await.expect("welcome").expect("message");
        let welcome: serde_json::Value = serde_json::from_str(welcome.to_text().expect("text")).expect("json");
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["zoom"], 43.0);

        ws.send(Message::Text(r#"{"type":"key","code":"ArrowUp","pressed":true}"#.into()))
            .await
            .expect("send");
        ws.send(Message::Text(r#"{"type":"ping"}"#.into())).await.expect("send");

        // the pong is queued after the key was applied
        let pong = ws.next().await.expect("pong").expect("message");
        assert_eq!(pong.to_text().expect("text"), r#"{"type":"pong"}"#);
        assert!(state.lock().await.input.forward);

        ws.close(None).await.expect("close");
        for _ in 0..50 {
            if state.lock().await.clients.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let session = state.lock().await;
        assert!(session.clients.is_empty());
        assert!(!session.input.forward);
    }
}
