//! Client error taxonomy.
//!
//! Every variant is caught at the boundary where it occurs and turned into a
//! single status message by the session. None of them are fatal to the
//! process.

use crate::ingest::InputKind;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Webcam permission was denied or no capture device exists.
    #[error("webcam unavailable: {0}")]
    DeviceAccess(String),

    /// Start was requested with nothing to process.
    #[error("no {0} loaded")]
    NoMediaLoaded(InputKind),

    /// The last health check failed, or none has succeeded yet.
    #[error("inference backend offline")]
    BackendOffline,

    /// Non-2xx status, transport failure, or an undecodable prediction body.
    #[error("inference request failed: {detail}")]
    InferenceRequest { status: Option<u16>, detail: String },

    /// Frame extraction produced no bytes. Skipped, never shown to the user.
    #[error("frame capture yielded no data")]
    EmptyCapture,

    /// A picked file could not be decoded into a capture surface.
    #[error("could not load media: {0}")]
    MediaLoad(String),
}

impl ClientError {
    pub(crate) fn http_status(status: u16, body: &[u8]) -> Self {
        let snippet = String::from_utf8_lossy(&body[..body.len().min(200)]);
        let detail = if snippet.trim().is_empty() {
            format!("status {}", status)
        } else {
            format!("status {}: {}", status, snippet.trim())
        };
        ClientError::InferenceRequest {
            status: Some(status),
            detail,
        }
    }

    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::InferenceRequest {
            status: None,
            detail: err.to_string(),
        }
    }

    /// HTTP status attached to an inference failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::InferenceRequest { status, .. } => *status,
            _ => None,
        }
    }
}
