use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::reply::{ReplyOrchestrator, TurnCompleted};
use crate::session::{CallSession, SessionRegistry};
use crate::transcription::{EventSource, TranscriptionEvent};

/// Which `Turn` fragments are appended to the call transcript
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationMode {
    /// Every non-empty fragment, interim or final
    #[default]
    All,
    /// Only fragments carried by an end-of-turn event
    FinalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn in progress
    Idle,
    /// Backend session live, fragments for the current turn arriving
    Accumulating,
}

/// Whether the listening loop should keep going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Stop,
}

/// Why a listening loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// Backend sent `Termination`
    Terminated,
    /// Connection closed without `Termination`
    StreamClosed,
    ReceiveFailed(String),
}

/// Interprets transcription events for one media leg
pub struct TurnProcessor {
    registry: SessionRegistry,
    active_call: watch::Receiver<String>,
    orchestrator: Arc<ReplyOrchestrator>,
    mode: AccumulationMode,
    state: TurnState,
    session: Option<Arc<CallSession>>,
    turns_completed: usize,
}

impl TurnProcessor {
    pub fn new(
        registry: SessionRegistry,
        active_call: watch::Receiver<String>,
        orchestrator: Arc<ReplyOrchestrator>,
        mode: AccumulationMode,
    ) -> Self {
        Self {
            registry,
            active_call,
            orchestrator,
            mode,
            state: TurnState::Idle,
            session: None,
            turns_completed: 0,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// End-of-turn triggers handed to the reply queue so far
    pub fn turns_completed(&self) -> usize {
        self.turns_completed
    }

    /// Session for the leg's current call identifier (follows `start` updates)
    async fn session(&mut self) -> Option<Arc<CallSession>> {
        let call_id = self.active_call.borrow().clone();
        if call_id.is_empty() {
            return None;
        }

        match &self.session {
            Some(session) if session.call_id() == call_id => Some(Arc::clone(session)),
            _ => {
                let session = self.registry.get_or_create(&call_id).await;
                self.session = Some(Arc::clone(&session));
                Some(session)
            }
        }
    }

    pub async fn handle(&mut self, event: TranscriptionEvent) -> TurnOutcome {
        if let Some(session) = self.session().await {
            session.touch();
        }

        match event {
            TranscriptionEvent::Begin { id, .. } => {
                info!("Transcription session started: {}", id.unwrap_or_default());
                self.state = TurnState::Accumulating;
                TurnOutcome::Continue
            }
            TranscriptionEvent::Turn {
                transcript,
                end_of_turn,
                ..
            } => {
                self.handle_turn(transcript.trim(), end_of_turn).await;
                TurnOutcome::Continue
            }
            TranscriptionEvent::Termination {
                audio_duration_seconds,
                session_duration_seconds,
            } => {
                info!(
                    "Transcription termination (audio={:?}s, session={:?}s)",
                    audio_duration_seconds, session_duration_seconds
                );
                self.state = TurnState::Idle;
                TurnOutcome::Stop
            }
            TranscriptionEvent::Unknown => TurnOutcome::Continue,
        }
    }

    async fn handle_turn(&mut self, fragment: &str, end_of_turn: bool) {
        let Some(session) = self.session().await else {
            warn!("Turn event before the call identifier is known; dropping");
            return;
        };

        let keep = match self.mode {
            AccumulationMode::All => true,
            AccumulationMode::FinalOnly => end_of_turn,
        };
        if keep && !fragment.is_empty() {
            session.append_fragment(fragment).await;
            debug!("[TURN] {}", fragment);
        }
        self.state = TurnState::Accumulating;

        if end_of_turn {
            let turn = TurnCompleted {
                call_id: session.call_id().to_string(),
                transcript: session.transcript_text().await,
            };
            if session.reply_queue(&self.orchestrator).dispatch(turn) {
                self.turns_completed += 1;
            }
            self.state = TurnState::Idle;
        }
    }
}

/// Drive `processor` from `events` until termination, close or receive failure
pub async fn run_listener(
    mut events: Box<dyn EventSource>,
    mut processor: TurnProcessor,
) -> ListenerExit {
    loop {
        match events.receive_event().await {
            Ok(Some(event)) => {
                debug!("Transcription event: {}", event.kind());
                if processor.handle(event).await == TurnOutcome::Stop {
                    return ListenerExit::Terminated;
                }
            }
            Ok(None) => return ListenerExit::StreamClosed,
            Err(e) => {
                warn!("Transcription listener exiting: {}", e);
                return ListenerExit::ReceiveFailed(e.to_string());
            }
        }
    }
}
