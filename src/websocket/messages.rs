//! WebSocket Message Types
//!
//! Client requests and server pushes for the live dashboard feed.

use serde::{Deserialize, Serialize};

use crate::dashboard::{ActiveCelebration, DashboardEvent, Notice};
use crate::poll::CycleReport;

/// Topic carrying committed cycles and notices
pub const TOPIC_DASHBOARD: &str = "dashboard";
/// Topic carrying celebration start/end
pub const TOPIC_CELEBRATIONS: &str = "celebrations";
/// Topic carrying poll failures
pub const TOPIC_SYSTEM: &str = "system";

pub const TOPICS: [&str; 3] = [TOPIC_DASHBOARD, TOPIC_CELEBRATIONS, TOPIC_SYSTEM];

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A poll cycle committed
    CycleCompleted { report: Box<CycleReport> },
    PollFailed { message: String },
    CelebrationStarted {
        celebration: ActiveCelebration,
        title: String,
        message: String,
    },
    CelebrationEnded { id: u64 },
    Notice { notice: Notice },
    Subscribed { topics: Vec<String> },
    Unsubscribed { topics: Vec<String> },
    Pong,
    Error { message: String },
    Connected { connection_id: String },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub topic: String,
    pub message: ServerMessage,
}

impl WsEvent {
    pub fn cycle_completed(report: CycleReport) -> Self {
        Self {
            topic: TOPIC_DASHBOARD.to_string(),
            message: ServerMessage::CycleCompleted {
                report: Box::new(report),
            },
        }
    }

    pub fn poll_failed(message: &str) -> Self {
        Self {
            topic: TOPIC_SYSTEM.to_string(),
            message: ServerMessage::PollFailed {
                message: message.to_string(),
            },
        }
    }

    /// Map a dashboard change to its push message, if clients care about it.
    ///
    /// `challenger` and `incumbent` are display handles used in the
    /// celebration text.
    pub fn from_dashboard(event: DashboardEvent, challenger: &str, incumbent: &str) -> Option<Self> {
        let (topic, message) = match event {
            DashboardEvent::CelebrationStarted(active) => (
                TOPIC_CELEBRATIONS,
                ServerMessage::CelebrationStarted {
                    title: active.celebration.title().to_string(),
                    message: active.celebration.message(challenger, incumbent),
                    celebration: active,
                },
            ),
            DashboardEvent::CelebrationEnded { id } => {
                (TOPIC_CELEBRATIONS, ServerMessage::CelebrationEnded { id })
            }
            DashboardEvent::NoticeRaised(notice) => (TOPIC_DASHBOARD, ServerMessage::Notice { notice }),
            // failures already reach clients as poll_failed
            DashboardEvent::ErrorChanged(_) => return None,
        };

        Some(Self {
            topic: topic.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Celebration;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["dashboard", "celebrations"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => {
                assert_eq!(topics, vec!["dashboard", "celebrations"]);
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_celebration_event_text() {
        let active = ActiveCelebration {
            id: 7,
            celebration: Celebration::ReachedFirst,
            cycle: 3,
        };
        let event = WsEvent::from_dashboard(
            DashboardEvent::CelebrationStarted(active),
            "gemini.is-a.bot",
            "nytimes.com",
        )
        .unwrap();

        assert_eq!(event.topic, TOPIC_CELEBRATIONS);
        let json = serde_json::to_value(&event.message).unwrap();
        assert_eq!(json["type"], "celebration_started");
        assert_eq!(json["title"], "#1 Most Blocked!");
        assert_eq!(json["celebration"]["kind"], "reached_first");
        assert!(json["message"].as_str().unwrap().starts_with("gemini.is-a.bot"));
    }

    #[test]
    fn test_error_changes_not_pushed() {
        assert!(WsEvent::from_dashboard(DashboardEvent::ErrorChanged(None), "a", "b").is_none());
    }

    #[test]
    fn test_server_message_serialize() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);

        let json = serde_json::to_string(&ServerMessage::PollFailed {
            message: "boom".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"poll_failed""#));
    }
}
