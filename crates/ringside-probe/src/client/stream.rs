//! Media-stream client
//!
//! A stream moves through three handle types so that event order is
//! checked by the compiler:
//!
//! ```rust,ignore
//! let connected = MediaStreamClient::new("ws://localhost:8080").connect("CA123").await?;
//! let mut started = connected.start(StartPayload::for_call("CA123")).await?;
//! started.send_media(&silence(DEFAULT_CHUNK_BYTES)).await?;
//! let summary = started.stop().await?.close().await?;
//! ```
//!
//! Media can only be sent on a [`StartedStream`], and `stop` consumes it.

use futures_util::SinkExt;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::contracts::*;
use crate::error::{ProbeError, Result};

use super::DEFAULT_TIMEOUT;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens media streams against a webhook server
#[derive(Debug, Clone)]
pub struct MediaStreamClient {
    base_url: String,
    timeout: Duration,
}

impl MediaStreamClient {
    /// Create a client; `http(s)://` base URLs are mapped to `ws(s)://`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = if let Some(rest) = base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if let Some(rest) = base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else {
            base_url
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the connect timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the stream for a call
    pub fn stream_url(&self, call_id: &str) -> String {
        format!("{}/media-stream/{}", self.base_url, call_id)
    }

    /// Open the duplex connection
    pub async fn connect(&self, call_id: &str) -> Result<ConnectedStream> {
        if call_id.is_empty() || call_id.contains('/') {
            return Err(ProbeError::validation(format!(
                "invalid call id '{}'",
                call_id
            )));
        }

        let url = self.stream_url(call_id);
        let (socket, _) =
            tokio::time::timeout(self.timeout, tokio_tungstenite::connect_async(url.as_str()))
                .await
                .map_err(|_| {
                    ProbeError::transport(format!(
                        "connect to {} timed out after {}ms",
                        url,
                        self.timeout.as_millis()
                    ))
                })??;

        tracing::debug!(url = %url, "Media stream connected");

        Ok(ConnectedStream {
            socket,
            url,
            sent: Vec::new(),
        })
    }
}

async fn send_event(socket: &mut Socket, event: &StreamEvent) -> Result<()> {
    let frame = event.to_frame()?;
    socket.send(Message::Text(frame)).await?;
    Ok(())
}

/// Connected, no events sent yet
pub struct ConnectedStream {
    socket: Socket,
    url: String,
    sent: Vec<&'static str>,
}

impl ConnectedStream {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Declare call metadata and audio format
    pub async fn start(mut self, start: StartPayload) -> Result<StartedStream> {
        let event = StreamEvent::Start {
            stream_sid: start.stream_sid.clone(),
            start: start.clone(),
        };
        send_event(&mut self.socket, &event).await?;
        self.sent.push(event.name());

        tracing::debug!(stream_sid = %start.stream_sid, call_sid = %start.call_sid, "Stream started");

        Ok(StartedStream {
            socket: self.socket,
            start,
            next_chunk: 1,
            started_at: Instant::now(),
            sent: self.sent,
        })
    }
}

/// Started; accepts media frames until stopped
pub struct StartedStream {
    socket: Socket,
    start: StartPayload,
    next_chunk: u64,
    started_at: Instant,
    sent: Vec<&'static str>,
}

impl StartedStream {
    pub fn stream_sid(&self) -> &str {
        &self.start.stream_sid
    }

    /// Number of media frames sent so far
    pub fn frames_sent(&self) -> u64 {
        self.next_chunk - 1
    }

    /// Send one audio frame; returns its chunk number
    pub async fn send_media(&mut self, audio: &[u8]) -> Result<u64> {
        if audio.is_empty() {
            return Err(ProbeError::validation("media frame is empty"));
        }

        let chunk = self.next_chunk;
        let timestamp = self.started_at.elapsed().as_millis() as u64;
        let event = StreamEvent::Media {
            stream_sid: self.start.stream_sid.clone(),
            media: MediaPayload::inbound(chunk, timestamp, audio),
        };
        send_event(&mut self.socket, &event).await?;
        self.sent.push(event.name());
        self.next_chunk += 1;

        Ok(chunk)
    }

    /// Declare call termination
    pub async fn stop(mut self) -> Result<StoppedStream> {
        let event = StreamEvent::Stop {
            stream_sid: self.start.stream_sid.clone(),
            stop: StopPayload {
                call_sid: self.start.call_sid.clone(),
                account_sid: self.start.account_sid.clone(),
            },
        };
        send_event(&mut self.socket, &event).await?;
        self.sent.push(event.name());

        tracing::debug!(stream_sid = %self.start.stream_sid, frames = self.frames_sent(), "Stream stopped");

        Ok(StoppedStream {
            summary: StreamSummary {
                call_sid: self.start.call_sid,
                stream_sid: self.start.stream_sid,
                frames_sent: self.next_chunk - 1,
                events: self.sent,
                duration_ms: self.started_at.elapsed().as_millis() as u64,
            },
            socket: self.socket,
        })
    }
}

/// Stopped; only closing remains
pub struct StoppedStream {
    socket: Socket,
    summary: StreamSummary,
}

impl StoppedStream {
    /// Close the connection
    pub async fn close(mut self) -> Result<StreamSummary> {
        match self.socket.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(self.summary),
            Err(e) => Err(e.into()),
        }
    }
}

/// What a finished stream sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub call_sid: String,
    pub stream_sid: String,
    pub frames_sent: u64,
    /// Event names in send order
    pub events: Vec<&'static str>,
    pub duration_ms: u64,
}
