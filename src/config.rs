use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::turn::AccumulationMode;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub transcription: TranscriptionConfig,
    pub call_control: CallControlConfig,
    pub reply: ReplyConfig,
    pub turns: TurnConfig,
    pub sessions: SessionRetentionConfig,
    pub greeting: GreetingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Public base URL the telephony platform reaches us on (e.g. an ngrok tunnel)
    pub public_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "call-bridge".to_string(),
            http: HttpConfig::default(),
            public_url: "http://localhost:5000".to_string(),
        }
    }
}

impl ServiceConfig {
    /// WebSocket base derived from the public URL (https → wss, http → ws)
    pub fn ws_base(&self) -> String {
        let base = self.public_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("wss://{}", base)
        }
    }

    pub fn http_base(&self) -> String {
        self.public_url.trim_end_matches('/').to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Streaming endpoint without the audio-format query
    pub url: String,
    pub sample_rate: u32,
    pub encoding: String,
    pub format_turns: bool,
    pub connect_timeout_secs: u64,
    /// How long a finished leg waits for its listener before aborting it
    pub listener_grace_secs: u64,
    /// Falls back to `AAI_TOKEN`
    pub api_key: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            url: "wss://streaming.assemblyai.com/v3/ws".to_string(),
            sample_rate: 8000,
            encoding: "pcm_mulaw".to_string(),
            format_turns: false,
            connect_timeout_secs: 30,
            listener_grace_secs: 5,
            api_key: None,
        }
    }
}

impl TranscriptionConfig {
    /// Full endpoint including the fixed audio-format descriptor
    pub fn endpoint(&self) -> String {
        format!(
            "{}?sample_rate={}&encoding={}&format_turns={}",
            self.url, self.sample_rate, self.encoding, self.format_turns
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn listener_grace(&self) -> Duration {
        Duration::from_secs(self.listener_grace_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallControlConfig {
    pub api_base: String,
    /// Falls back to `TWILIO_ACCOUNT_SID`
    pub account_sid: Option<String>,
    /// Falls back to `TWILIO_AUTH_TOKEN`
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for CallControlConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twilio.com".to_string(),
            account_sid: None,
            auth_token: None,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    pub api_base: String,
    /// Falls back to `OPENAI_API_KEY`
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub fallback: String,
    /// Trailing characters of the transcript handed to the generator
    pub transcript_window_chars: usize,
    pub request_timeout_secs: u64,
    /// Language attribute for spoken replies
    pub say_language: String,
    /// Pending end-of-turn triggers per call before new ones are dropped
    pub queue_depth: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            system_prompt: "You are a helpful phone receptionist for Horsler Lift Services. \
                            Reply briefly and clearly."
                .to_string(),
            temperature: 0.3,
            max_tokens: 120,
            fallback: "Thanks, I heard you. How can I help you today?".to_string(),
            transcript_window_chars: 1200,
            request_timeout_secs: 20,
            say_language: "en-GB".to_string(),
            queue_depth: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    pub accumulation: AccumulationMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionRetentionConfig {
    /// 0 keeps sessions for the lifetime of the process
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionRetentionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 2 * 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    pub text: String,
    pub language: String,
    pub pause_secs: u32,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            text: "Thank you for calling Horsler Lift Services, \
                   the lift company that always gives a duck. \
                   Kindly note, calls are recorded for training and monitoring purposes. \
                   You are speaking with an automated assistant, so please speak clearly \
                   and wait for me to finish speaking, \
                   that helps me understand you better. How can I help you today?"
                .to_string(),
            language: "en-GB".to_string(),
            pause_secs: 600,
        }
    }
}

impl Config {
    /// Load from a config file (optional) plus `CALL_BRIDGE__*` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CALL_BRIDGE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Failed to deserialize config")?;
        cfg.apply_secret_env();

        Ok(cfg)
    }

    /// Fill unset credentials from the conventional environment variables
    pub fn apply_secret_env(&mut self) {
        fill_from_env(&mut self.transcription.api_key, "AAI_TOKEN");
        fill_from_env(&mut self.reply.api_key, "OPENAI_API_KEY");
        fill_from_env(&mut self.call_control.account_sid, "TWILIO_ACCOUNT_SID");
        fill_from_env(&mut self.call_control.auth_token, "TWILIO_AUTH_TOKEN");
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    let unset = slot.as_deref().map(str::trim).unwrap_or_default().is_empty();
    if unset {
        *slot = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
    }
}
