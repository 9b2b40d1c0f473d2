//! Error types for the call bridge
//!
//! Failures are classified by how far they are allowed to reach:
//! - `Connect` stops a media leg before it starts
//! - `Send` / `Receive` stop the loop that hit them and tear the leg down
//! - `Decode` drops a single message
//! - `Collaborator` is absorbed by the reply path (fallback text or a log line)

use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("transcription connect failed: {0}")]
    Connect(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("collaborator failed: {0}")]
    Collaborator(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for BridgeError {
    fn from(err: base64::DecodeError) -> Self {
        BridgeError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Collaborator(err.to_string())
    }
}
