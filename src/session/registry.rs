use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::call::CallSession;

/// Process-wide map of call identifier → session
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<CallSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `call_id`, creating an empty one if absent
    ///
    /// Concurrent callers for the same identifier always receive the same record.
    pub async fn get_or_create(&self, call_id: &str) -> Arc<CallSession> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(call_id) {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(call_id.to_string()).or_insert_with(|| {
            info!("Creating call session: {}", call_id);
            Arc::new(CallSession::new(call_id))
        });
        Arc::clone(session)
    }

    pub async fn get(&self, call_id: &str) -> Option<Arc<CallSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(call_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `ttl` that no live leg still references
    ///
    /// Returns the evicted call identifiers.
    pub async fn evict_idle(&self, ttl: Duration) -> Vec<String> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let cutoff = Utc::now() - ttl;

        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| {
                Arc::strong_count(session) == 1 && session.last_activity() < cutoff
            })
            .map(|(call_id, _)| call_id.clone())
            .collect();

        for call_id in &expired {
            sessions.remove(call_id);
            info!("Evicted idle call session: {}", call_id);
        }

        expired
    }

    /// Periodically evict idle sessions. A zero `ttl` disables eviction.
    pub fn spawn_sweeper(&self, ttl: Duration, interval: Duration) -> Option<JoinHandle<()>> {
        if ttl.is_zero() {
            info!("Session eviction disabled; sessions live for the process lifetime");
            return None;
        }

        let registry = self.clone();
        let interval = interval.max(Duration::from_secs(1));

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(ttl).await;
                if !evicted.is_empty() {
                    debug!("Session sweep evicted {} session(s)", evicted.len());
                }
            }
        }))
    }
}
