//! WebSocket Handler
//!
//! Upgrades `/ws` requests and pumps messages between the socket and the hub.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting WebSocket connection");
            if let Some(msg) = encode(&ServerMessage::Error { message: e.to_string() }) {
                let _ = sender.send(msg).await;
            }
            return;
        }
    };

    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    if let Some(msg) = encode(&connected) {
        if sender.send(msg).await.is_err() {
            hub.unregister(&connection_id).await;
            return;
        }
    }

    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Some(msg) = encode(&message) else { continue };
            if sender.send(msg).await.is_err() {
                tracing::debug!(connection_id = %send_id, "WebSocket send failed, closing connection");
                break;
            }
        }
    });

    let recv_hub = Arc::clone(&hub);
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&recv_hub, &recv_id, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(connection_id = %recv_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(&connection_id).await;
}

/// Returns false when the connection should close
async fn handle_ws_message(hub: &ConnectionHub, connection_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_client_message(hub, connection_id, client_msg).await,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Invalid client message");
                    ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    }
                }
            };
            let _ = hub.send_to(connection_id, reply).await;
            true
        }
        Message::Binary(_) => {
            let reply = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, reply).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

async fn handle_client_message(hub: &ConnectionHub, connection_id: &str, message: ClientMessage) -> ServerMessage {
    let result = match message {
        ClientMessage::Subscribe { topics } => hub
            .subscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Subscribed { topics }),
        ClientMessage::Unsubscribe { topics } => hub
            .unsubscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Unsubscribed { topics }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(connection_id = %connection_id, error = %e, "Client request failed");
        ServerMessage::Error { message: e.to_string() }
    })
}
