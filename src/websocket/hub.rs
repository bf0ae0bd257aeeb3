//! WebSocket Connection Hub
//!
//! Tracks live connections and their topic subscriptions and fans pushed
//! events out to subscribers.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, TOPICS};

pub type ConnectionId = String;

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

struct ConnectionHandle {
    sender: mpsc::UnboundedSender<ServerMessage>,
    subscriptions: HashSet<String>,
}

pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    config: HubConfig,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a connection; fails once the connection limit is reached
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    pub async fn unregister(&self, id: &str) {
        if self.connections.write().await.remove(id).is_some() {
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
    }

    /// Subscribe to topics. Unknown topics are skipped; the accepted ones are returned.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subscribed = Vec::new();
        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }
            handle.subscriptions.insert(topic.clone());
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    pub async fn unsubscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let unsubscribed: Vec<String> = topics
            .into_iter()
            .filter(|topic| handle.subscriptions.remove(topic))
            .collect();

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic; returns the delivery count
    pub async fn publish(&self, event: &WsEvent) -> usize {
        let connections = self.connections.read().await;

        let sent = connections
            .values()
            .filter(|handle| handle.subscriptions.contains(&event.topic))
            .filter(|handle| handle.sender.send(event.message.clone()).is_ok())
            .count();

        if sent > 0 {
            tracing::trace!(topic = %event.topic, subscribers = sent, "Broadcast event");
        }
        sent
    }

    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|handle| handle.subscriptions.contains(topic))
            .count()
    }
}

fn is_valid_topic(topic: &str) -> bool {
    TOPICS.contains(&topic)
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
