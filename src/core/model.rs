use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Closed set of social event kinds the overlay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Follow,
    Subscriber,
    Cheer,
    Host,
    Raid,
    Tip,
}

impl EventKind {
    pub fn all() -> &'static [EventKind] {
        &[
            Self::Follow,
            Self::Subscriber,
            Self::Cheer,
            Self::Host,
            Self::Raid,
            Self::Tip,
        ]
    }

    /// Wire name used by the realtime channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Subscriber => "subscriber",
            Self::Cheer => "cheer",
            Self::Host => "host",
            Self::Raid => "raid",
            Self::Tip => "tip",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// An inbound social event after normalization by the source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: Value,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl NormalizedEvent {
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self {
            kind,
            data,
            received_at: Utc::now(),
        }
    }

    /// Name shown on the badge.
    ///
    /// Test events nest it under `event.name`; live events carry `displayName`/`username`
    /// at the top level of the payload.
    pub fn display_name(&self) -> Option<&str> {
        ["/event/name", "/displayName", "/username"]
            .iter()
            .filter_map(|pointer| self.data.pointer(pointer))
            .filter_map(Value::as_str)
            .find(|name| !name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EventKind::all() {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), *kind);
        }
        let err = "donation".parse::<EventKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown event kind 'donation'");
    }

    #[test]
    fn test_event_deserializes_from_wire_shape() {
        let event: NormalizedEvent = serde_json::from_value(json!({
            "type": "subscriber",
            "data": { "event": { "name": "Bob" } }
        }))
        .unwrap();

        assert_eq!(event.kind, EventKind::Subscriber);
        assert_eq!(event.display_name(), Some("Bob"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let live = NormalizedEvent::new(
            EventKind::Follow,
            json!({ "username": "alice", "displayName": "Alice" }),
        );
        assert_eq!(live.display_name(), Some("Alice"));

        let bare = NormalizedEvent::new(EventKind::Follow, json!({ "username": "carol" }));
        assert_eq!(bare.display_name(), Some("carol"));

        let blank = NormalizedEvent::new(EventKind::Follow, json!({ "event": { "name": "  " } }));
        assert_eq!(blank.display_name(), None);
    }
}
