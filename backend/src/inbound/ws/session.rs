//! One dashboard connection to the report feed.
//!
//! The client gets the whole snapshot when it connects and again whenever
//! the cache publishes. We ping every 5s and drop clients that stay silent
//! for 10s; test builds shrink both so timeouts are observable quickly.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::Snapshot;
use crate::inbound::ws::messages::{FeedRequest, ReportFeedMessage};

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Drives the feed until either side goes away.
pub(super) async fn handle_ws_session(
    updates: watch::Receiver<Snapshot>,
    session: Session,
    stream: MessageStream,
) {
    let mut feed = Feed {
        session,
        updates,
        last_seen: Instant::now(),
    };
    let exit = feed.pump(stream).await;
    exit.log();
    if let Some(reason) = exit.close_reason() {
        if let Err(error) = feed.session.close(Some(reason)).await {
            warn!(%error, "closing report feed failed");
        }
    }
}

/// Why a feed stopped.
enum Exit {
    ClientClosed(Option<CloseReason>),
    StreamEnded,
    CacheDropped,
    Idle,
    Protocol(ProtocolError),
    BadPayload,
    SendFailed(Closed),
}

impl Exit {
    /// Close frame to send, if the socket can still take one.
    fn close_reason(&self) -> Option<CloseReason> {
        let (code, description) = match self {
            Self::ClientClosed(reason) => {
                return Some(reason.clone().unwrap_or(CloseReason {
                    code: CloseCode::Normal,
                    description: None,
                }));
            }
            Self::StreamEnded | Self::SendFailed(_) => return None,
            Self::Idle => (CloseCode::Normal, "heartbeat timeout"),
            Self::CacheDropped => (CloseCode::Away, "feed closed"),
            Self::Protocol(_) => (CloseCode::Protocol, "protocol error"),
            Self::BadPayload => (CloseCode::Policy, "invalid payload"),
        };
        Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        })
    }

    fn log(&self) {
        match self {
            Self::Idle => warn!("report feed client went quiet; disconnecting"),
            Self::CacheDropped => warn!("report cache dropped; closing feed"),
            Self::Protocol(error) => warn!(%error, "report feed protocol error"),
            Self::SendFailed(error) => warn!(%error, "report feed send failed"),
            Self::ClientClosed(_) | Self::StreamEnded | Self::BadPayload => {
                debug!("report feed finished");
            }
        }
    }
}

struct Feed {
    session: Session,
    updates: watch::Receiver<Snapshot>,
    last_seen: Instant,
}

impl Feed {
    async fn pump(&mut self, mut stream: MessageStream) -> Exit {
        if let Err(exit) = self.push_snapshot().await {
            return exit;
        }
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        loop {
            let step = tokio::select! {
                _ = heartbeat.tick() => self.beat().await,
                changed = self.updates.changed() => match changed {
                    Ok(()) => self.push_snapshot().await,
                    Err(_) => Err(Exit::CacheDropped),
                },
                incoming = stream.recv() => match incoming {
                    Some(Ok(message)) => self.receive(message).await,
                    Some(Err(error)) => Err(Exit::Protocol(error)),
                    None => Err(Exit::StreamEnded),
                },
            };
            if let Err(exit) = step {
                return exit;
            }
        }
    }

    async fn beat(&mut self) -> Result<(), Exit> {
        if self.last_seen.elapsed() > CLIENT_TIMEOUT {
            return Err(Exit::Idle);
        }
        self.session.ping(b"").await.map_err(Exit::SendFailed)
    }

    async fn receive(&mut self, message: Message) -> Result<(), Exit> {
        if let Message::Close(reason) = message {
            return Err(Exit::ClientClosed(reason));
        }
        self.last_seen = Instant::now();
        match message {
            Message::Ping(payload) => self.session.pong(&payload).await.map_err(Exit::SendFailed),
            Message::Text(text) => match serde_json::from_str::<FeedRequest>(&text) {
                Ok(FeedRequest::Refresh) => {
                    debug!("report feed refresh requested");
                    self.push_snapshot().await
                }
                Err(error) => {
                    warn!(%error, "rejected malformed report feed message");
                    Err(Exit::BadPayload)
                }
            },
            _ => Ok(()),
        }
    }

    async fn push_snapshot(&mut self) -> Result<(), Exit> {
        let snapshot = self.updates.borrow_and_update().clone();
        let body = match serde_json::to_string(&ReportFeedMessage::snapshot(snapshot.as_slice())) {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, "report snapshot did not serialise");
                return Ok(());
            }
        };
        self.session.text(body).await.map_err(Exit::SendFailed)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
