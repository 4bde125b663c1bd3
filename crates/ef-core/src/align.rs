//! Choosing the alignment event of each session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::types::FlowError;

/// Wildcard spellings accepted for [`EventMatcher::Any`].
const ANY_EVENT: &str = "*";
const ANY_EVENT_ALIAS: &str = "any";

/// Which events qualify as alignment candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EventMatcher {
    /// Every event qualifies.
    #[default]
    Any,
    /// Only events with this exact name qualify.
    Named(String),
}

impl EventMatcher {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => event.name == *name,
        }
    }
}

impl fmt::Display for EventMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(ANY_EVENT),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for EventMatcher {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == ANY_EVENT || s.eq_ignore_ascii_case(ANY_EVENT_ALIAS) {
            Ok(Self::Any)
        } else {
            Ok(Self::Named(s.to_string()))
        }
    }
}

impl Serialize for EventMatcher {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventMatcher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Selects the depth-0 event of a session: the Nth event accepted by a matcher.
///
/// `occurrence` is 1-based. Negative values count from the end of the session,
/// so `-1` picks the last match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    event: EventMatcher,
    occurrence: i32,
}

impl Alignment {
    pub fn new(event: EventMatcher, occurrence: i32) -> Result<Self, FlowError> {
        if occurrence == 0 {
            return Err(FlowError::ZeroOccurrence);
        }
        Ok(Self { event, occurrence })
    }

    pub const fn event(&self) -> &EventMatcher {
        &self.event
    }

    pub const fn occurrence(&self) -> i32 {
        self.occurrence
    }

    /// Returns the index of the alignment event, or `None` if the session has
    /// fewer matches than requested.
    pub fn find(&self, events: &[Event]) -> Option<usize> {
        find_nth_index(events, self.occurrence, |event| self.event.matches(event))
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self {
            event: EventMatcher::Any,
            occurrence: 1,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.event, self.occurrence)
    }
}

/// Finds the index of the `n`th element accepted by `predicate`.
///
/// Positive `n` scans forward from the start, so ties resolve to the earliest
/// qualifying index. Negative `n` scans backward from the end. `n == 0` never
/// matches.
pub fn find_nth_index<T>(items: &[T], n: i32, predicate: impl Fn(&T) -> bool) -> Option<usize> {
    let wanted = usize::try_from(n.unsigned_abs()).ok()?.checked_sub(1)?;
    if n > 0 {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| predicate(item))
            .nth(wanted)
            .map(|(idx, _)| idx)
    } else {
        items
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, item)| predicate(item))
            .nth(wanted)
            .map(|(idx, _)| idx)
    }
}
