use serde::{Deserialize, Serialize};

/// Event received from the streaming transcription backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TranscriptionEvent {
    /// Session acknowledgment
    Begin {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        expires_at: Option<i64>,
    },

    /// Transcript update for the current turn
    Turn {
        #[serde(default)]
        transcript: String,
        #[serde(default)]
        end_of_turn: bool,
        #[serde(default)]
        turn_order: Option<u64>,
        #[serde(default)]
        end_of_turn_confidence: Option<f64>,
    },

    /// Backend is closing the connection
    Termination {
        #[serde(default)]
        audio_duration_seconds: Option<f64>,
        #[serde(default)]
        session_duration_seconds: Option<f64>,
    },

    /// Any other event type (ignored)
    #[serde(other)]
    Unknown,
}

impl TranscriptionEvent {
    /// Shorthand for a `Turn` event with no optional metadata
    pub fn turn(transcript: impl Into<String>, end_of_turn: bool) -> Self {
        TranscriptionEvent::Turn {
            transcript: transcript.into(),
            end_of_turn,
            turn_order: None,
            end_of_turn_confidence: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TranscriptionEvent::Begin { .. } => "Begin",
            TranscriptionEvent::Turn { .. } => "Turn",
            TranscriptionEvent::Termination { .. } => "Termination",
            TranscriptionEvent::Unknown => "Unknown",
        }
    }
}

/// Control message asking the backend to end the session
#[derive(Debug, Serialize)]
pub struct TerminateMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Default for TerminateMessage {
    fn default() -> Self {
        Self { kind: "Terminate" }
    }
}
