//! In-process realtime hub.
//!
//! Row changes and typing indicators are fanned out over per-channel
//! broadcast senders. Channel names follow the conventions the clients
//! subscribe with: `user:{id}` for a profile's notifications and direct
//! messages, `request:{id}` for a request thread, `support` for the
//! admin support inbox. Lagging subscribers drop events; clients keep
//! their polling fallback for exactly that case.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: String, // 'insert', 'update', 'typing'
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub payload: Value,
}

impl Event {
    pub fn insert(table: &str, payload: Value) -> Self {
        Self {
            kind: "insert".to_owned(),
            table: Some(table.to_owned()),
            payload,
        }
    }

    pub fn update(table: &str, payload: Value) -> Self {
        Self {
            kind: "update".to_owned(),
            table: Some(table.to_owned()),
            payload,
        }
    }

    pub fn typing(payload: Value) -> Self {
        Self {
            kind: "typing".to_owned(),
            table: None,
            payload,
        }
    }
}

#[derive(Clone)]
pub struct Hub {
    channels: Arc<DashMap<String, broadcast::Sender<String>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        self.channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        self.sender(channel).subscribe()
    }

    /// Publish an event. A send error only means nobody is subscribed,
    /// which is fine.
    pub fn publish(&self, channel: &str, event: &Event) {
        match serde_json::to_string(event) {
            Ok(text) => {
                let _ = self.sender(channel).send(text);
            }
            Err(e) => tracing::error!("failed to serialize realtime event: {}", e),
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

pub fn user_channel(user_id: i32) -> String {
    format!("user:{}", user_id)
}

pub fn request_channel(request_id: i32) -> String {
    format!("request:{}", request_id)
}

pub const SUPPORT_CHANNEL: &str = "support";
