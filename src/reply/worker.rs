use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::orchestrator::ReplyOrchestrator;

/// End-of-turn notification handed from the event listener to the reply worker
#[derive(Debug, Clone, PartialEq)]
pub struct TurnCompleted {
    pub call_id: String,
    /// Full accumulated transcript at the moment the turn ended
    pub transcript: String,
}

/// Per-call queue drained by a single worker, so replies for one call stay in turn order
#[derive(Debug, Clone)]
pub struct ReplyQueue {
    tx: mpsc::Sender<TurnCompleted>,
}

impl ReplyQueue {
    pub fn spawn(orchestrator: Arc<ReplyOrchestrator>, call_id: &str) -> Self {
        let (tx, mut rx) = mpsc::channel::<TurnCompleted>(orchestrator.queue_depth());
        let call_id = call_id.to_string();

        tokio::spawn(async move {
            debug!("Reply worker started for {}", call_id);

            while let Some(turn) = rx.recv().await {
                let outcome = orchestrator.respond(&turn.call_id, &turn.transcript).await;
                debug!("Reply for {}: {:?}", turn.call_id, outcome);
            }

            debug!("Reply worker stopped for {}", call_id);
        });

        Self { tx }
    }

    /// Queue a completed turn. Returns `false` if it was dropped.
    pub fn dispatch(&self, turn: TurnCompleted) -> bool {
        match self.tx.try_send(turn) {
            Ok(()) => true,
            Err(TrySendError::Full(turn)) => {
                warn!(
                    "Reply queue full for {}; dropping end-of-turn trigger",
                    turn.call_id
                );
                false
            }
            Err(TrySendError::Closed(turn)) => {
                info!("Reply worker gone for {}; dropping trigger", turn.call_id);
                false
            }
        }
    }
}
