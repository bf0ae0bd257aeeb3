//! WebSocket Live Feed
//!
//! Clients connect to `/ws` and subscribe to topics:
//! - `dashboard`: committed cycles and count-increased notices
//! - `celebrations`: celebration overlays starting and ending
//! - `system`: poll failures
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:4173/ws');
//! ws.onopen = () => ws.send(JSON.stringify({type: 'subscribe', topics: ['dashboard']}));
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use messages::{
    ClientMessage, ServerMessage, WsEvent, TOPICS, TOPIC_CELEBRATIONS, TOPIC_DASHBOARD, TOPIC_SYSTEM,
};
