//! Grouping flat event records into sessions.
//!
//! Records arrive in any order, each tagged with the session it belongs to.
//! Sessions keep the order in which their first record was seen, and events
//! inside a session are stably sorted by time before their elapsed offsets are
//! rebased to the session's first event.

use chrono::DateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::event::{Event, Session};
use crate::types::FlowError;

/// A flat event record as loaded from JSONL.
///
/// Either `timestamp` (RFC 3339) or `elapsed_ms` must be present. Any other
/// field is kept as an event attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Session identity.
    pub session: String,
    /// Event type.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<i64>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl EventRecord {
    /// Returns the record's position on the session clock in milliseconds.
    fn time_ms(&self, record: usize) -> Result<i64, FlowError> {
        match (&self.timestamp, self.elapsed_ms) {
            (Some(ts), _) => DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.timestamp_millis())
                .map_err(|source| FlowError::InvalidTimestamp {
                    record,
                    value: ts.clone(),
                    source,
                }),
            (None, Some(ms)) => Ok(ms),
            (None, None) => Err(FlowError::InvalidRecord {
                record,
                reason: "missing both `timestamp` and `elapsed_ms`".to_string(),
            }),
        }
    }
}

/// Groups records into chronologically ordered sessions.
pub fn group_sessions(records: Vec<EventRecord>) -> Result<Vec<Session>, FlowError> {
    let mut grouped: IndexMap<String, Vec<(i64, usize, Event)>> = IndexMap::new();

    for (idx, record) in records.into_iter().enumerate() {
        if record.session.trim().is_empty() {
            return Err(FlowError::InvalidRecord {
                record: idx,
                reason: "empty session id".to_string(),
            });
        }
        if record.name.trim().is_empty() {
            return Err(FlowError::InvalidRecord {
                record: idx,
                reason: "empty event name".to_string(),
            });
        }
        let time_ms = record.time_ms(idx)?;
        let event = Event {
            name: record.name,
            elapsed_ms: 0,
            attributes: record.attributes,
        };
        grouped
            .entry(record.session)
            .or_default()
            .push((time_ms, idx, event));
    }

    let mut sessions = Vec::with_capacity(grouped.len());
    for (id, mut timed) in grouped {
        timed.sort_by_key(|(time_ms, _, _)| *time_ms);
        let start = timed.first().map_or(0, |(time_ms, _, _)| *time_ms);
        let mut events = Vec::with_capacity(timed.len());
        for (time_ms, record, mut event) in timed {
            event.elapsed_ms = time_ms
                .checked_sub(start)
                .ok_or_else(|| FlowError::InvalidRecord {
                    record,
                    reason: format!("{time_ms}ms is too far from session start {start}ms"),
                })?;
            events.push(event);
        }
        sessions.push(Session::new(id, events));
    }

    tracing::debug!(sessions = sessions.len(), "grouped records into sessions");
    Ok(sessions)
}
