// Engine.IO v3 / Socket.IO v2 text framing as spoken by the StreamElements realtime service.
//
// Every websocket text frame is one engine packet: a single digit type followed by an optional
// payload. Engine type `4` wraps a socket packet, whose own type digit follows; socket events
// carry a JSON array `["name", data]`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::error::SourceError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds
    pub ping_interval: u64,
    /// Milliseconds
    pub ping_timeout: u64,
}

/// Floor for the server-announced ping period
pub const MIN_PING_INTERVAL: Duration = Duration::from_secs(1);

impl Handshake {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval).max(MIN_PING_INTERVAL)
    }

    /// Longest silence tolerated before the link is considered dead
    pub fn liveness_window(&self) -> Duration {
        self.ping_interval() + Duration::from_millis(self.ping_timeout)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, data: Value },
    Ack,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, SourceError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| SourceError::Protocol("empty frame".to_string()))?;
        let body = chars.as_str();
        match kind {
            '0' => serde_json::from_str(body)
                .map(EnginePacket::Open)
                .map_err(|e| SourceError::Protocol(format!("bad handshake: {}", e))),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping),
            '3' => Ok(EnginePacket::Pong),
            '4' => SocketPacket::decode(body).map(EnginePacket::Message),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(SourceError::Protocol(format!("unknown engine packet type {:?}", other))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            // Only ever sent by the server
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping => "2".to_string(),
            EnginePacket::Pong => "3".to_string(),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

impl SocketPacket {
    fn decode(body: &str) -> Result<Self, SourceError> {
        let mut chars = body.chars();
        let kind = chars
            .next()
            .ok_or_else(|| SourceError::Protocol("empty socket packet".to_string()))?;
        // Namespace ("/nsp,") and ack id prefixes are not used on the default namespace
        let rest = chars.as_str().trim_start_matches(|c: char| c.is_ascii_digit());
        match kind {
            '0' => Ok(SocketPacket::Connect),
            '1' => Ok(SocketPacket::Disconnect),
            '2' => decode_event(rest),
            '3' => Ok(SocketPacket::Ack),
            '4' => Ok(SocketPacket::Error(rest.trim_matches('"').to_string())),
            other => Err(SourceError::Protocol(format!("unsupported socket packet type {:?}", other))),
        }
    }

    fn encode(&self) -> String {
        match self {
            SocketPacket::Connect => "0".to_string(),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { name, data } => format!("2{}", json!([name, data])),
            SocketPacket::Ack => "3".to_string(),
            SocketPacket::Error(message) => format!("4{}", json!(message)),
        }
    }
}

fn decode_event(body: &str) -> Result<SocketPacket, SourceError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::Protocol(format!("bad event payload: {}", e)))?;
    let Value::Array(mut items) = value else {
        return Err(SourceError::Protocol("event payload is not an array".to_string()));
    };
    if items.is_empty() {
        return Err(SourceError::Protocol("event without a name".to_string()));
    }
    let name = match items.remove(0) {
        Value::String(name) => name,
        other => return Err(SourceError::Protocol(format!("event name is not a string: {}", other))),
    };
    let data = if items.is_empty() { Value::Null } else { items.remove(0) };
    Ok(SocketPacket::Event { name, data })
}

/// `42["name",data]`
pub fn event(name: &str, data: Value) -> EnginePacket {
    EnginePacket::Message(SocketPacket::Event {
        name: name.to_string(),
        data,
    })
}

/// JWT authentication request sent right after the socket connects.
pub fn authenticate(token: &str) -> EnginePacket {
    event("authenticate", json!({ "method": "jwt", "token": token }))
}
