// Realtime event source.
//
// Architecture:
// - socketio.rs: Engine.IO/Socket.IO text frame codec
// - normalize.rs: `event` / `event:test` payloads -> NormalizedEvent
// - client.rs: websocket connection, authentication, keepalive and reconnect; pushes every
//   normalized event onto the queue and pokes the dispatcher
//
// Delivery is at-most-once: events emitted while disconnected are lost.

pub mod client;
pub mod normalize;
pub mod socketio;

pub use client::{SourceConfig, StreamElementsSource};
