use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::call_control::{call_control_from_config, CallControl};
use super::generator::{generator_from_config, trailing_window, ReplyGenerator};
use crate::config::{Config, ReplyConfig};
use crate::media::CALL_ID_PARAMETER;
use crate::twiml::VoiceResponse;

/// Path of the stream re-entry webhook
pub const CONTINUE_PATH: &str = "/voice_stream_continue";

/// Result of one reply attempt (never an error: failures are absorbed here)
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// Call-control mutation accepted
    Submitted { reply: String },
    /// Nothing submitted (empty reply or no call-control client)
    Skipped { reply: String },
    /// Call-control mutation rejected or unreachable
    Failed { reply: String, error: String },
}

impl ReplyOutcome {
    pub fn reply(&self) -> &str {
        match self {
            ReplyOutcome::Submitted { reply }
            | ReplyOutcome::Skipped { reply }
            | ReplyOutcome::Failed { reply, .. } => reply,
        }
    }
}

/// Turns a completed transcript into a spoken reply plus stream redirect
pub struct ReplyOrchestrator {
    generator: Arc<dyn ReplyGenerator>,
    call_control: Option<Arc<dyn CallControl>>,
    fallback: String,
    window_chars: usize,
    say_language: String,
    continue_url: String,
    queue_depth: usize,
}

impl ReplyOrchestrator {
    pub fn new(
        generator: Arc<dyn ReplyGenerator>,
        call_control: Option<Arc<dyn CallControl>>,
        config: &ReplyConfig,
        continue_url: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            call_control,
            fallback: config.fallback.clone(),
            window_chars: config.transcript_window_chars,
            say_language: config.say_language.clone(),
            continue_url: continue_url.into(),
            queue_depth: config.queue_depth.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let generator = generator_from_config(&config.reply)?;
        let call_control = call_control_from_config(&config.call_control)?;
        let continue_url = format!("{}{}", config.service.http_base(), CONTINUE_PATH);
        Ok(Self::new(generator, call_control, &config.reply, continue_url))
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    pub fn has_call_control(&self) -> bool {
        self.call_control.is_some()
    }

    /// Reply text for the transcript, substituting the fallback on any failure
    pub async fn reply_text(&self, transcript: &str) -> String {
        let window = trailing_window(transcript, self.window_chars).trim();
        if window.is_empty() {
            return self.fallback.clone();
        }

        match self.generator.generate(window).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                warn!("Reply generator returned empty text; using fallback");
                self.fallback.clone()
            }
            Err(e) => {
                error!("Reply generation failed: {}", e);
                self.fallback.clone()
            }
        }
    }

    /// Re-entry URL carrying the call identifier
    pub fn continue_url_for(&self, call_id: &str) -> String {
        match reqwest::Url::parse_with_params(&self.continue_url, &[(CALL_ID_PARAMETER, call_id)]) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}?{}={}", self.continue_url, CALL_ID_PARAMETER, call_id),
        }
    }

    /// Speak `reply`, then redirect back into the media stream
    pub fn reply_document(&self, call_id: &str, reply: &str) -> VoiceResponse {
        VoiceResponse::new()
            .say(reply, Some(self.say_language.as_str()))
            .redirect(self.continue_url_for(call_id))
    }

    pub async fn respond(&self, call_id: &str, transcript: &str) -> ReplyOutcome {
        let reply = self.reply_text(transcript).await;

        let call_control = match &self.call_control {
            Some(client) if !reply.is_empty() && !call_id.is_empty() => client,
            _ => {
                info!("Reply for {} not submitted: {}", call_id, reply);
                return ReplyOutcome::Skipped { reply };
            }
        };

        let twiml = self.reply_document(call_id, &reply).to_xml();
        match call_control.update_call(call_id, &twiml).await {
            Ok(()) => {
                info!("Pushed reply + redirect for {}", call_id);
                ReplyOutcome::Submitted { reply }
            }
            Err(e) => {
                error!("Call update failed for {}: {}", call_id, e);
                ReplyOutcome::Failed {
                    reply,
                    error: e.to_string(),
                }
            }
        }
    }
}
