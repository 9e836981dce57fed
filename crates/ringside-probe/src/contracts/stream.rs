//! Telephony media-stream events
//!
//! JSON text frames discriminated by `event`:
//!
//! ```json
//! {"event":"start","streamSid":"MZ..","start":{"callSid":"CA..","mediaFormat":{..}}}
//! {"event":"media","streamSid":"MZ..","media":{"track":"inbound","chunk":"1","payload":".."}}
//! {"event":"stop","streamSid":"MZ..","stop":{"callSid":"CA..","accountSid":"AC.."}}
//! ```

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Bytes per media frame: 20 ms of 8 kHz mu-law audio
pub const DEFAULT_CHUNK_BYTES: usize = 160;

/// Duration covered by one default frame
pub const DEFAULT_FRAME_MS: u64 = 20;

/// Mu-law encoding of silence
const MULAW_SILENCE: u8 = 0xFF;

/// Audio format declared in the start event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for MediaFormat {
    fn default() -> Self {
        Self {
            encoding: "audio/x-mulaw".to_string(),
            sample_rate: 8000,
            channels: 1,
        }
    }
}

/// Call metadata declared when a stream starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    pub call_sid: String,
    pub stream_sid: String,
    pub account_sid: String,
    pub tracks: Vec<String>,
    pub media_format: MediaFormat,
}

impl StartPayload {
    /// Metadata for a simulated inbound call
    pub fn for_call(call_sid: impl Into<String>) -> Self {
        let call_sid = call_sid.into();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            stream_sid: format!("MZ{}", suffix),
            account_sid: "ACringsideprobe".to_string(),
            call_sid,
            tracks: vec!["inbound".to_string()],
            media_format: MediaFormat::default(),
        }
    }
}

/// One audio frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub track: String,
    /// Decimal chunk number, starting at 1
    pub chunk: String,
    /// Milliseconds since the stream started
    pub timestamp: String,
    /// Base64-encoded audio
    pub payload: String,
}

impl MediaPayload {
    /// Frame `chunk` of an inbound track
    pub fn inbound(chunk: u64, timestamp_ms: u64, audio: &[u8]) -> Self {
        Self {
            track: "inbound".to_string(),
            chunk: chunk.to_string(),
            timestamp: timestamp_ms.to_string(),
            payload: base64::engine::general_purpose::STANDARD.encode(audio),
        }
    }

    /// Chunk number as an integer
    pub fn chunk_number(&self) -> Result<u64> {
        self.chunk
            .parse()
            .map_err(|_| ProbeError::validation(format!("chunk '{}' is not a number", self.chunk)))
    }

    /// Decoded audio bytes
    pub fn decode_audio(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.payload)
            .map_err(|e| ProbeError::validation(format!("media payload is not base64: {}", e)))
    }
}

/// Call termination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPayload {
    pub call_sid: String,
    pub account_sid: String,
}

/// A media-stream event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        start: StartPayload,
    },
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
    Stop {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        stop: StopPayload,
    },
}

impl StreamEvent {
    /// `start`, `media` or `stop`
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Start { .. } => "start",
            StreamEvent::Media { .. } => "media",
            StreamEvent::Stop { .. } => "stop",
        }
    }

    pub fn stream_sid(&self) -> &str {
        match self {
            StreamEvent::Start { stream_sid, .. }
            | StreamEvent::Media { stream_sid, .. }
            | StreamEvent::Stop { stream_sid, .. } => stream_sid,
        }
    }

    /// Encode as a JSON text frame
    pub fn to_frame(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ProbeError::validation(format!("unencodable stream event: {}", e)))
    }

    /// Decode a JSON text frame
    pub fn from_frame(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ProbeError::validation(format!("malformed stream event: {}", e)))
    }
}

/// A fixed-size frame of silence
pub fn silence(bytes: usize) -> Vec<u8> {
    vec![MULAW_SILENCE; bytes]
}

/// Lifecycle of a media stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    Connecting,
    Started,
    Stopped,
    Closed,
}

/// Validates the order of events on one stream
///
/// `Connecting -> Started -> (Media)* -> Stopped -> Closed`. Exactly one
/// start precedes all media, chunk numbers strictly increase, and exactly
/// one stop follows all media.
#[derive(Debug, Clone)]
pub struct StreamSequencer {
    phase: StreamPhase,
    stream_sid: Option<String>,
    last_chunk: u64,
    media_frames: u64,
}

impl Default for StreamSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSequencer {
    pub fn new() -> Self {
        Self {
            phase: StreamPhase::Connecting,
            stream_sid: None,
            last_chunk: 0,
            media_frames: 0,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    /// Media frames accepted so far
    pub fn media_frames(&self) -> u64 {
        self.media_frames
    }

    /// Accept the next event or explain why it is out of order
    pub fn accept(&mut self, event: &StreamEvent) -> Result<StreamPhase> {
        if let Some(sid) = &self.stream_sid {
            if sid != event.stream_sid() {
                return Err(ProbeError::validation(format!(
                    "{} event for stream {} on stream {}",
                    event.name(),
                    event.stream_sid(),
                    sid
                )));
            }
        }

        match (self.phase, event) {
            (StreamPhase::Connecting, StreamEvent::Start { stream_sid, .. }) => {
                self.stream_sid = Some(stream_sid.clone());
                self.phase = StreamPhase::Started;
            }
            (StreamPhase::Started, StreamEvent::Media { media, .. }) => {
                let chunk = media.chunk_number()?;
                media.decode_audio()?;
                if chunk <= self.last_chunk {
                    return Err(ProbeError::validation(format!(
                        "chunk {} does not follow chunk {}",
                        chunk, self.last_chunk
                    )));
                }
                self.last_chunk = chunk;
                self.media_frames += 1;
            }
            (StreamPhase::Started, StreamEvent::Stop { .. }) => {
                self.phase = StreamPhase::Stopped;
            }
            (phase, event) => {
                return Err(ProbeError::validation(format!(
                    "{} event not allowed while {:?}",
                    event.name(),
                    phase
                )));
            }
        }

        Ok(self.phase)
    }

    /// Mark the connection closed
    pub fn close(&mut self) -> StreamPhase {
        self.phase = StreamPhase::Closed;
        self.phase
    }
}
