//! Core type definitions and the crate error type.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while ingesting events, aggregating them, or deriving scales.
///
/// Input is expected to come from a trusted loader, so every variant here is a
/// malformed-input condition that must stop the pipeline rather than produce a
/// corrupt graph.
#[derive(Debug, Error)]
pub enum FlowError {
    /// An event had an empty name.
    #[error("session {session}: event {index} has an empty name")]
    EmptyEventName { session: usize, index: usize },

    /// Events within a session went backwards in time.
    #[error(
        "session {session}: event {index} at {elapsed_ms}ms precedes the previous event at {previous_ms}ms"
    )]
    UnorderedSession {
        session: usize,
        index: usize,
        elapsed_ms: i64,
        previous_ms: i64,
    },

    /// Alignment occurrences are 1-based (or negative from the end).
    #[error("alignment occurrence must be non-zero")]
    ZeroOccurrence,

    /// An alignment predicate pointed past the end of its session.
    #[error("session {session}: alignment index {index} is out of bounds for {len} events")]
    AlignmentOutOfBounds {
        session: usize,
        index: usize,
        len: usize,
    },

    /// An event's offset from its alignment event does not fit in an `i64`.
    #[error("session {session}: elapsed time of event {index} overflows")]
    ElapsedOverflow { session: usize, index: usize },

    /// Target dimensions must be finite and non-negative.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    /// A flat record could not be turned into an event.
    #[error("record {record}: {reason}")]
    InvalidRecord { record: usize, reason: String },

    /// A record's timestamp could not be parsed.
    #[error("record {record}: invalid timestamp {value:?}")]
    InvalidTimestamp {
        record: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Index of a node inside a [`Graph`](crate::Graph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The synthetic root every graph starts with.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Which side of the alignment event a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The alignment event itself and everything after it (depth >= 0).
    After,
    /// Everything before the alignment event (depth < 0).
    Before,
}

impl Side {
    /// Returns the side a depth belongs to.
    #[must_use]
    pub const fn of_depth(depth: i32) -> Self {
        if depth >= 0 { Self::After } else { Self::Before }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::After => "after",
            Self::Before => "before",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
