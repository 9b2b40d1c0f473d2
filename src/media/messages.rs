use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::BridgeResult;

/// Custom parameter carrying the call identifier on `start`
pub const CALL_ID_PARAMETER: &str = "callSid";

/// Envelope received on the call-audio stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MediaEnvelope {
    Connected {
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },
    Start {
        #[serde(default)]
        start: StartMetadata,
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
    Media {
        media: MediaPayload,
    },
    Stop {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
    Mark {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl MediaEnvelope {
    pub fn decode(text: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartMetadata {
    pub account_sid: Option<String>,
    pub call_sid: Option<String>,
    pub stream_sid: Option<String>,
    pub tracks: Vec<String>,
    pub custom_parameters: HashMap<String, String>,
}

impl StartMetadata {
    /// Call identifier from the stream's custom parameters, if present and non-empty
    pub fn custom_call_id(&self) -> Option<&str> {
        self.custom_parameters
            .get(CALL_ID_PARAMETER)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Base64 μ-law audio (8kHz, mono)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl MediaPayload {
    pub fn audio_bytes(&self) -> BridgeResult<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(&self.payload)?)
    }
}
