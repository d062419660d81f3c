//! Websocket scoring stream.
//!
//! Each text message is one frame; each gets exactly one reply. The loop
//! ends when the client sends a close frame or the stream ends.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::handlers::{FrameRequest, FrameScore};
use crate::state::AppState;

pub async fn ws_score(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    log::info!("Websocket client connected");
    let (mut sender, mut receiver) = socket.split();
    let mut replies = 0usize;

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                log::debug!("Websocket receive failed: {e}");
                break;
            }
        };

        let reply = reply_to(&text, state.scores.score());
        if sender.send(Message::Text(reply)).await.is_err() {
            break;
        }
        replies += 1;
    }

    log::info!("Websocket client disconnected after {replies} replies");
}

/// Builds the JSON reply for one text message.
pub fn reply_to(text: &str, score: f64) -> String {
    let request = FrameRequest::parse_lenient(text.as_bytes());
    serde_json::to_string(&FrameScore::new(request, score))
        .unwrap_or_else(|_| String::from(r#"{"frame_id":null,"score":0.0}"#))
}
