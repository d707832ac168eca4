use serde_json::Value;

use crate::core::error::NormalizeError;
use crate::core::model::{EventKind, NormalizedEvent};

/// Live activity, `{ "type": "follow", "data": { ... } }`
pub const LIVE_EVENT: &str = "event";
/// Emulated activity from the dashboard, `{ "listener": "follower-latest", "event": { ... } }`
pub const TEST_EVENT: &str = "event:test";

const TEST_LISTENERS: &[(&str, EventKind)] = &[
    ("follower-latest", EventKind::Follow),
    ("subscriber-latest", EventKind::Subscriber),
];

pub fn listener_kind(listener: &str) -> Option<EventKind> {
    TEST_LISTENERS
        .iter()
        .find(|(name, _)| *name == listener)
        .map(|(_, kind)| *kind)
}

/// Turns one socket event into a queueable event.
///
/// `Ok(None)` means the socket event is not an activity at all (`authenticated` and friends).
/// Errors are payloads that should have been activities but cannot be shown.
pub fn normalize(event_name: &str, payload: &Value) -> Result<Option<NormalizedEvent>, NormalizeError> {
    match event_name {
        LIVE_EVENT => {
            let kind = payload
                .get("type")
                .and_then(Value::as_str)
                .ok_or(NormalizeError::MissingField("type"))?;
            let kind = kind
                .parse::<EventKind>()
                .map_err(|e| NormalizeError::UnknownKind(e.0))?;
            let data = payload.get("data").cloned().unwrap_or(Value::Null);
            Ok(Some(NormalizedEvent::new(kind, data)))
        }
        TEST_EVENT => {
            let listener = payload
                .get("listener")
                .and_then(Value::as_str)
                .ok_or(NormalizeError::MissingField("listener"))?;
            let kind = listener_kind(listener)
                .ok_or_else(|| NormalizeError::UnmappedListener(listener.to_string()))?;
            Ok(Some(NormalizedEvent::new(kind, payload.clone())))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_live_event() {
        let payload = json!({
            "_id": "5f0c",
            "channel": "chan",
            "type": "subscriber",
            "data": { "username": "bob", "displayName": "Bob", "amount": 3 }
        });
        let event = normalize(LIVE_EVENT, &payload).unwrap().unwrap();

        assert_eq!(event.kind, EventKind::Subscriber);
        assert_eq!(event.data["amount"], 3);
        assert_eq!(event.display_name(), Some("Bob"));
    }

    #[test]
    fn test_live_event_with_unknown_type() {
        let payload = json!({ "type": "merch", "data": {} });
        assert_eq!(
            normalize(LIVE_EVENT, &payload).unwrap_err(),
            NormalizeError::UnknownKind("merch".to_string())
        );
        assert_eq!(
            normalize(LIVE_EVENT, &json!({ "data": {} })).unwrap_err(),
            NormalizeError::MissingField("type")
        );
    }

    #[test]
    fn test_test_event_listener_mapping() {
        let payload = json!({
            "listener": "follower-latest",
            "event": { "name": "Alice" }
        });
        let event = normalize(TEST_EVENT, &payload).unwrap().unwrap();

        assert_eq!(event.kind, EventKind::Follow);
        assert_eq!(event.data, payload);
        assert_eq!(event.display_name(), Some("Alice"));

        assert_eq!(listener_kind("subscriber-latest"), Some(EventKind::Subscriber));
    }

    #[test]
    fn test_unmapped_listener_is_dropped() {
        let payload = json!({ "listener": "tip-latest", "event": { "name": "Carol", "amount": 5 } });
        assert_eq!(
            normalize(TEST_EVENT, &payload).unwrap_err(),
            NormalizeError::UnmappedListener("tip-latest".to_string())
        );
    }

    #[test]
    fn test_other_socket_events_are_ignored() {
        let payload = json!({ "channelId": "chan" });
        assert_eq!(normalize("authenticated", &payload).unwrap(), None);
        assert_eq!(normalize("event:update", &payload).unwrap(), None);
    }
}
