//! WebSocket endpoint for realtime farm and region notifications

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;

use crate::services::{ClientEvent, RealtimeHub};
use crate::AppState;

/// Upgrade to a WebSocket bound to a fresh hub subscription
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: RealtimeHub) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = hub.subscribe();
    tracing::info!(subscriber = %subscription.id(), "Client connected");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(subscriber = %subscription.id(), "Socket error: {}", e);
                        break;
                    }
                };

                let outcome = serde_json::from_str::<ClientEvent>(&text)
                    .map_err(|e| e.to_string())
                    .and_then(|event| {
                        hub.handle_client_event(&mut subscription, event)
                            .map_err(|e| e.to_string())
                    });

                if let Err(message) = outcome {
                    let frame = json!({ "event": "error", "data": { "message": message } });
                    if sender.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
            }
            outgoing = subscription.recv() => {
                let Some(message) = outgoing else { break };
                let frame = match serde_json::to_string(&*message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!("Failed to serialize room message: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!(subscriber = %subscription.id(), "Client disconnected");
}
