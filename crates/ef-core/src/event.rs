//! Events and the sessions that order them.

use serde::{Deserialize, Serialize};

/// A single event inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The event type, used as the tree key.
    pub name: String,
    /// Milliseconds since the first event of the session.
    pub elapsed_ms: i64,
    /// Any other fields the record carried.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    /// Creates an event without extra attributes.
    pub fn new(name: impl Into<String>, elapsed_ms: i64) -> Self {
        Self {
            name: name.into(),
            elapsed_ms,
            attributes: serde_json::Map::new(),
        }
    }
}

/// A chronologically ordered run of events from one user or process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Identity shared by every event of the session.
    pub id: String,
    /// Events in chronological order.
    pub events: Vec<Event>,
}

impl Session {
    pub fn new(id: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            id: id.into(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Points at one event of the input: `(session index, event index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef {
    pub session: usize,
    pub event: usize,
}
