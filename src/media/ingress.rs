use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::messages::MediaEnvelope;
use super::transport::MediaTransport;
use crate::session::{CallSession, SessionRegistry};
use crate::transcription::AudioUplink;

/// Why an ingress loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressExit {
    /// `stop` envelope received (normal end of a media leg)
    Stopped,
    /// Platform closed the stream without `stop`
    TransportClosed,
    SendFailed(String),
    ReceiveFailed(String),
}

/// Counters for one media leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressSummary {
    pub call_id: String,
    pub envelopes: u64,
    pub frames_forwarded: u64,
    pub decode_failures: u64,
    pub exit: IngressExit,
}

/// Relays call audio from the media stream to the transcription uplink
pub struct MediaIngress {
    registry: SessionRegistry,
    active_call: watch::Sender<String>,
    fallback_call_id: String,
    session: Option<Arc<CallSession>>,
}

impl MediaIngress {
    /// `fallback_call_id` is the identifier supplied when the stream was opened
    pub fn new(
        registry: SessionRegistry,
        active_call: watch::Sender<String>,
        fallback_call_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            active_call,
            fallback_call_id: fallback_call_id.into(),
            session: None,
        }
    }

    pub fn active_call_id(&self) -> String {
        self.active_call.borrow().clone()
    }

    pub async fn run(
        &mut self,
        transport: &mut dyn MediaTransport,
        uplink: &mut dyn AudioUplink,
    ) -> IngressSummary {
        let mut envelopes = 0u64;
        let mut frames_forwarded = 0u64;
        let mut decode_failures = 0u64;

        let exit = loop {
            let text = match transport.next_message().await {
                None => break IngressExit::TransportClosed,
                Some(Err(e)) => {
                    error!("Media stream receive failed: {}", e);
                    break IngressExit::ReceiveFailed(e.to_string());
                }
                Some(Ok(text)) => text,
            };
            envelopes += 1;
            if let Some(session) = &self.session {
                session.touch();
            }

            let envelope = match MediaEnvelope::decode(&text) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!("Dropping malformed media envelope: {}", e);
                    decode_failures += 1;
                    continue;
                }
            };

            match envelope {
                MediaEnvelope::Connected { protocol, .. } => {
                    debug!("Media stream connected ({})", protocol.unwrap_or_default());
                }
                MediaEnvelope::Start { start, stream_sid } => {
                    let call_id = start
                        .custom_call_id()
                        .unwrap_or(&self.fallback_call_id)
                        .to_string();
                    info!(
                        "Media stream started: call={} stream={}",
                        call_id,
                        stream_sid.unwrap_or_default()
                    );
                    self.bind_call(call_id).await;
                }
                MediaEnvelope::Media { media } => {
                    let frame = match media.audio_bytes() {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Dropping media frame with bad payload: {}", e);
                            decode_failures += 1;
                            continue;
                        }
                    };
                    if let Err(e) = uplink.send_audio(frame).await {
                        error!("Forwarding audio to transcription failed: {}", e);
                        break IngressExit::SendFailed(e.to_string());
                    }
                    frames_forwarded += 1;
                }
                MediaEnvelope::Stop { .. } => {
                    info!("Media stream stop for {}", self.active_call_id());
                    if let Err(e) = uplink.terminate().await {
                        debug!("Terminate request not delivered: {}", e);
                    }
                    break IngressExit::Stopped;
                }
                MediaEnvelope::Mark { .. } | MediaEnvelope::Unknown => {}
            }
        };

        IngressSummary {
            call_id: self.active_call_id(),
            envelopes,
            frames_forwarded,
            decode_failures,
            exit,
        }
    }

    async fn bind_call(&mut self, call_id: String) {
        if !call_id.is_empty() {
            let session = self.registry.get_or_create(&call_id).await;
            session.record_leg();
            self.session = Some(session);
        }
        self.active_call.send_replace(call_id);
    }
}
