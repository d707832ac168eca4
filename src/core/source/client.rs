use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{interval_at, sleep, sleep_until, Instant, Interval};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use url::Url;

use super::normalize::normalize;
use super::socketio::{authenticate, EnginePacket, Handshake, SocketPacket};
use crate::core::config::Settings;
use crate::core::dispatcher::AlertDispatcher;
use crate::core::error::{NormalizeError, SourceError};
use crate::core::model::NormalizedEvent;

/// Silence tolerated before the server's handshake arrives
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub endpoint: Url,
    pub token: String,
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
}

impl SourceConfig {
    pub fn from_settings(settings: &Settings, token: String) -> Result<Self, SourceError> {
        let reconnect_min = Duration::from_secs(settings.reconnect_min_seconds.max(1));
        Ok(Self {
            endpoint: socket_url(&settings.realtime_url)?,
            token,
            reconnect_min,
            reconnect_max: Duration::from_secs(settings.reconnect_max_seconds).max(reconnect_min),
        })
    }
}

/// `https://host` -> `wss://host/socket.io/?EIO=3&transport=websocket`
pub fn socket_url(base: &str) -> Result<Url, SourceError> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(SourceError::Protocol(format!("unsupported scheme '{}'", other))),
    };
    url.set_scheme(scheme)
        .map_err(|()| SourceError::Protocol(format!("cannot use {} for {}", scheme, base)))?;
    url.set_path("/socket.io/");
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "3")
        .append_pair("transport", "websocket");
    Ok(url)
}

/// What to do after one inbound frame.
#[derive(Debug, Default, PartialEq)]
pub struct Reaction {
    pub replies: Vec<EnginePacket>,
    pub event: Option<NormalizedEvent>,
}

impl Reaction {
    fn reply(packet: EnginePacket) -> Self {
        Self {
            replies: vec![packet],
            event: None,
        }
    }
}

/// Protocol state of one websocket connection.
pub struct Session {
    token: String,
    handshake: Option<Handshake>,
    authenticated: bool,
}

impl Session {
    pub fn new(token: String) -> Self {
        Self {
            token,
            handshake: None,
            authenticated: false,
        }
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn liveness_window(&self) -> Duration {
        self.handshake
            .as_ref()
            .map_or(HANDSHAKE_TIMEOUT, Handshake::liveness_window)
    }

    /// Errors end the connection.
    pub fn on_frame(&mut self, frame: &str) -> Result<Reaction, SourceError> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                log::debug!(
                    "Engine session {} (ping every {}ms)",
                    handshake.sid,
                    handshake.ping_interval
                );
                self.handshake = Some(handshake);
                Ok(Reaction::default())
            }
            EnginePacket::Ping => Ok(Reaction::reply(EnginePacket::Pong)),
            EnginePacket::Pong | EnginePacket::Noop | EnginePacket::Upgrade => Ok(Reaction::default()),
            EnginePacket::Close => Err(SourceError::Protocol("server closed the session".to_string())),
            EnginePacket::Message(SocketPacket::Connect) => {
                log::info!("Successfully connected to the websocket");
                Ok(Reaction::reply(authenticate(&self.token)))
            }
            EnginePacket::Message(SocketPacket::Disconnect) => {
                Err(SourceError::Protocol("server disconnected the socket".to_string()))
            }
            EnginePacket::Message(SocketPacket::Error(message)) => Err(SourceError::Protocol(message)),
            EnginePacket::Message(SocketPacket::Ack) => Ok(Reaction::default()),
            EnginePacket::Message(SocketPacket::Event { name, data }) => self.on_event(&name, &data),
        }
    }

    fn on_event(&mut self, name: &str, data: &Value) -> Result<Reaction, SourceError> {
        match name {
            "authenticated" => {
                self.authenticated = true;
                let channel = data.get("channelId").and_then(Value::as_str).unwrap_or("?");
                log::info!("Successfully authenticated to channel {}", channel);
                Ok(Reaction::default())
            }
            "unauthorized" => {
                let message = data
                    .get("message")
                    .and_then(Value::as_str)
                    .map_or_else(|| data.to_string(), str::to_string);
                Err(SourceError::Unauthorized(message))
            }
            _ => match normalize(name, data) {
                Ok(event) => Ok(Reaction {
                    replies: Vec::new(),
                    event,
                }),
                Err(NormalizeError::UnmappedListener(listener)) => {
                    log::info!("Unhandled test event with listener {}", listener);
                    Ok(Reaction::default())
                }
                Err(e) => {
                    log::warn!("Dropping '{}' payload: {}", name, e);
                    Ok(Reaction::default())
                }
            },
        }
    }
}

enum Exit {
    Shutdown,
    Disconnected,
}

/// Realtime adapter: keeps a socket to StreamElements open and feeds the alert queue.
pub struct StreamElementsSource {
    config: SourceConfig,
    dispatcher: AlertDispatcher,
}

impl StreamElementsSource {
    pub fn new(config: SourceConfig, dispatcher: AlertDispatcher) -> Self {
        Self { config, dispatcher }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut backoff = self.config.reconnect_min;

        loop {
            if shutdown.try_recv().is_ok() {
                break;
            }

            log::info!("Connecting to {}", self.config.endpoint);
            let mut session = Session::new(self.config.token.clone());
            match self.serve(&mut session, &mut shutdown).await {
                Ok(Exit::Shutdown) => return,
                Ok(Exit::Disconnected) => log::info!("Disconnected from websocket"),
                Err(SourceError::Unauthorized(message)) => {
                    log::error!("Authentication rejected: {}", message);
                }
                Err(e) => log::error!("Realtime connection failed: {}", e),
            }

            if session.is_authenticated() {
                backoff = self.config.reconnect_min;
            }
            log::info!("Reconnecting in {:?}", backoff);
            tokio::select! {
                _ = shutdown.recv() => return,
                _ = sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(self.config.reconnect_max);
        }
    }

    fn deliver(&self, event: NormalizedEvent) {
        log::debug!("Queued {} event: {}", event.kind, event.data);
        self.dispatcher.queue().push(event);
        self.dispatcher.on_queue_activity();
    }

    async fn serve(
        &self,
        session: &mut Session,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<Exit, SourceError> {
        let (ws_stream, _) = connect_async(self.config.endpoint.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();
        let mut pinger: Option<Interval> = None;
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    log::info!("Realtime source shutting down...");
                    let _ = write.close().await;
                    return Ok(Exit::Shutdown);
                }
                _ = next_ping(&mut pinger) => {
                    write.send(WsMessage::Text(EnginePacket::Ping.encode().into())).await?;
                }
                _ = sleep_until(last_seen + session.liveness_window()) => {
                    return Err(SourceError::Protocol(format!(
                        "no traffic for {:?}",
                        session.liveness_window()
                    )));
                }
                msg = read.next() => {
                    last_seen = Instant::now();
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            log::trace!("<- {}", text.as_str());
                            let reaction = session.on_frame(text.as_str())?;
                            for reply in reaction.replies {
                                write.send(WsMessage::Text(reply.encode().into())).await?;
                            }
                            if let Some(event) = reaction.event {
                                self.deliver(event);
                            }
                            if pinger.is_none() {
                                pinger = session.handshake().map(pinger_for);
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            log::debug!("Close frame: {:?}", frame);
                            return Ok(Exit::Disconnected);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => return Ok(Exit::Disconnected),
                    }
                }
            }
        }
    }
}

/// First tick one period after the handshake
fn pinger_for(handshake: &Handshake) -> Interval {
    let period = handshake.ping_interval();
    interval_at(Instant::now() + period, period)
}

async fn next_ping(pinger: &mut Option<Interval>) {
    match pinger {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
