use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

use crate::reply::{ReplyOrchestrator, ReplyQueue};

/// Separator placed between accumulated utterance fragments
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Mutable state for one call, shared by every media leg of that call
pub struct CallSession {
    call_id: String,

    created_at: DateTime<Utc>,

    /// Milliseconds since the epoch of the last envelope or event seen for this call
    last_activity_ms: AtomicI64,

    /// Finalized utterance fragments in arrival order (append-only)
    transcript: Mutex<Vec<String>>,

    /// Number of media legs opened for this call
    legs: AtomicUsize,

    /// Single-worker reply queue, started on the first completed turn
    reply_queue: OnceLock<ReplyQueue>,
}

impl CallSession {
    pub fn new(call_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            created_at: now,
            last_activity_ms: AtomicI64::new(now.timestamp_millis()),
            transcript: Mutex::new(Vec::new()),
            legs: AtomicUsize::new(0),
            reply_queue: OnceLock::new(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn touch(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        let ms = self.last_activity_ms.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(ms).unwrap_or(self.created_at)
    }

    /// Append one fragment; empty fragments are ignored
    pub async fn append_fragment(&self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        let mut transcript = self.transcript.lock().await;
        transcript.push(fragment.to_string());
    }

    /// Full accumulated transcript joined with newlines
    pub async fn transcript_text(&self) -> String {
        let transcript = self.transcript.lock().await;
        transcript.join(FRAGMENT_SEPARATOR)
    }

    pub async fn fragment_count(&self) -> usize {
        self.transcript.lock().await.len()
    }

    pub fn record_leg(&self) -> usize {
        self.touch();
        self.legs.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn legs(&self) -> usize {
        self.legs.load(Ordering::SeqCst)
    }

    /// Reply queue for this call, spawning its worker on first use
    pub fn reply_queue(&self, orchestrator: &Arc<ReplyOrchestrator>) -> &ReplyQueue {
        self.reply_queue
            .get_or_init(|| ReplyQueue::spawn(Arc::clone(orchestrator), &self.call_id))
    }
}

impl std::fmt::Debug for CallSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSession")
            .field("call_id", &self.call_id)
            .field("created_at", &self.created_at)
            .field("legs", &self.legs())
            .finish_non_exhaustive()
    }
}
