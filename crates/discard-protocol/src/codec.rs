//! Codec for encoding and decoding Discard frames.
//!
//! Frames travel as JSON text, one object per WebSocket text message.
//! Encoding is fallible (size limit). Decoding comes in two forms:
//! [`decode`] is total and is what the dispatcher uses; [`try_decode`]
//! reports why a frame was rejected, for callers that want to log it.

use serde::Deserialize;
use thiserror::Error;

use crate::frames::{FrameKind, InboundFrame, OutboundFrame};

/// Largest frame the server will read before closing the connection.
pub const MAX_OUTBOUND_FRAME_SIZE: usize = 4096;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Encoded frame exceeds the server's read limit.
    #[error("Frame size {0} exceeds maximum {MAX_OUTBOUND_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Frame is not valid JSON or misses fields required by its type.
    #[error("Decoding error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Frame is well-formed but its `type` is not one the client routes.
    #[error("Unknown frame type: {0}")]
    UnknownType(String),
}

/// Encode an outbound frame to its JSON text form.
///
/// # Errors
///
/// Returns an error if the frame is too large for the server or encoding fails.
pub fn encode(frame: &OutboundFrame) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(frame).map_err(ProtocolError::Encode)?;

    if text.len() > MAX_OUTBOUND_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }

    Ok(text)
}

/// Decode an inbound frame, mapping every failure to
/// [`InboundFrame::Unrecognized`].
#[must_use]
pub fn decode(text: &str) -> InboundFrame {
    try_decode(text).unwrap_or(InboundFrame::Unrecognized)
}

/// Decode an inbound frame, reporting why it could not be understood.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownType`] for a well-formed frame with an
/// unrouted `type`, and [`ProtocolError::Decode`] for anything else.
pub fn try_decode(text: &str) -> Result<InboundFrame, ProtocolError> {
    serde_json::from_str(text).map_err(|err| match probe_type(text) {
        Some(discriminator) if FrameKind::from_type(&discriminator).is_none() => {
            ProtocolError::UnknownType(discriminator)
        }
        _ => ProtocolError::Decode(err),
    })
}

/// Pull just the `type` field out of a frame, if there is one.
fn probe_type(text: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Probe {
        #[serde(rename = "type")]
        discriminator: String,
    }

    serde_json::from_str::<Probe>(text)
        .ok()
        .map(|probe| probe.discriminator)
}
