// Error taxonomy.
//
// None of these are fatal to the process: alert errors become immediate completions,
// asset errors disable one capability, source errors lead to a reconnect.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::badge::scene::BadgeKind;
use super::model::EventKind;

/// Failure while displaying a single alert
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("no {0} badge in the loaded scene")]
    BadgeUnavailable(BadgeKind),
    #[error("{0} event has no display name")]
    MissingDisplayName(EventKind),
    #[error("scene rejected badge: {0}")]
    Scene(String),
}

/// Failure loading the scene manifest or the font
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("animation '{clip}' references unknown node '{node}'")]
    MissingNode { clip: String, node: String },
}

/// Failure on the realtime channel
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid realtime url: {0}")]
    Url(#[from] url::ParseError),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("authentication rejected: {0}")]
    Unauthorized(String),
}

/// Reason an inbound payload was dropped instead of queued
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unknown event type '{0}'")]
    UnknownKind(String),
    #[error("unhandled test event with listener '{0}'")]
    UnmappedListener(String),
    #[error("payload is missing '{0}'")]
    MissingField(&'static str),
}
