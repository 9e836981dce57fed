//! Media-stream WebSocket endpoint
//!
//! Events must arrive as start, media*, stop. An out-of-order or malformed
//! frame closes the socket with a policy-violation close frame.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use std::sync::Arc;

use super::AppState;
use crate::contracts::{StreamEvent, StreamPhase, StreamSequencer};

pub(super) async fn media_stream(
    ws: WebSocketUpgrade,
    Path(call_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    tracing::info!(call_id = %call_id, "Media stream upgrade requested");
    ws.on_upgrade(move |socket| handle_media_stream(socket, call_id, state))
}

async fn handle_media_stream(mut socket: WebSocket, call_id: String, state: Arc<AppState>) {
    let mut sequencer = StreamSequencer::new();

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(call_id = %call_id, error = %e, "Media stream receive failed");
                break;
            }
        };

        let accepted = StreamEvent::from_frame(&text)
            .and_then(|event| sequencer.accept(&event).map(|phase| (event, phase)));

        match accepted {
            Ok((event, phase)) => {
                state.metrics.record_stream_event(event.name());
                match &event {
                    StreamEvent::Start { start, .. } => tracing::info!(
                        call_id = %call_id,
                        stream_sid = %start.stream_sid,
                        encoding = %start.media_format.encoding,
                        sample_rate = start.media_format.sample_rate,
                        "Media stream started"
                    ),
                    StreamEvent::Media { media, .. } => {
                        tracing::trace!(call_id = %call_id, chunk = %media.chunk, "Media frame")
                    }
                    StreamEvent::Stop { .. } => tracing::info!(
                        call_id = %call_id,
                        frames = sequencer.media_frames(),
                        phase = ?phase,
                        "Media stream stopped"
                    ),
                }
            }
            Err(e) => {
                tracing::warn!(call_id = %call_id, error = %e, "Rejecting media stream");
                state.metrics.record_stream_closed("rejected");
                if let Err(send_err) = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: e.to_string().into(),
                    })))
                    .await
                {
                    tracing::debug!(call_id = %call_id, error = %send_err, "Failed to send close frame");
                }
                return;
            }
        }
    }

    let outcome = if sequencer.phase() == StreamPhase::Stopped {
        "completed"
    } else {
        tracing::warn!(call_id = %call_id, phase = ?sequencer.phase(), "Media stream closed before stop");
        "incomplete"
    };
    sequencer.close();
    state.metrics.record_stream_closed(outcome);
    tracing::info!(call_id = %call_id, frames = sequencer.media_frames(), outcome, "Media stream closed");
}
