// Shared in-memory fakes for the bridge's external collaborators.
//
// Each fake records what it was asked to do so tests can assert on the
// traffic without a telephony platform or transcription backend.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use call_bridge::config::ReplyConfig;
use call_bridge::error::{BridgeError, BridgeResult};
use call_bridge::reply::{CallControl, ReplyGenerator, ReplyOrchestrator};
use call_bridge::transcription::{AudioUplink, EventSource, TranscriptionEvent, UplinkConnector};
use call_bridge::MediaTransport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const CONTINUE_URL: &str = "https://bridge.test/voice_stream_continue";

// ============================================================================
// Media transport
// ============================================================================

/// Media stream fed by the test through a channel; dropping the sender closes it
pub struct ChannelTransport {
    rx: mpsc::UnboundedReceiver<String>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl MediaTransport for ChannelTransport {
    async fn next_message(&mut self) -> Option<BridgeResult<String>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn channel_transport() -> (
    mpsc::UnboundedSender<String>,
    ChannelTransport,
    Arc<AtomicUsize>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let closes = Arc::new(AtomicUsize::new(0));
    let transport = ChannelTransport {
        rx,
        closes: Arc::clone(&closes),
    };
    (tx, transport, closes)
}

pub fn start_json(call_id: Option<&str>) -> String {
    match call_id {
        Some(id) => format!(
            r#"{{"event":"start","start":{{"streamSid":"MZ1","customParameters":{{"callSid":"{}"}}}},"streamSid":"MZ1"}}"#,
            id
        ),
        None => r#"{"event":"start","start":{"streamSid":"MZ1"},"streamSid":"MZ1"}"#.to_string(),
    }
}

pub fn media_json(audio: &[u8]) -> String {
    format!(
        r#"{{"event":"media","media":{{"track":"inbound","payload":"{}"}}}}"#,
        base64::engine::general_purpose::STANDARD.encode(audio)
    )
}

pub fn stop_json() -> String {
    r#"{"event":"stop","stop":{"callSid":"CA1"},"streamSid":"MZ1"}"#.to_string()
}

// ============================================================================
// Transcription uplink
// ============================================================================

/// What a `RecordingUplink` saw
#[derive(Clone, Default)]
pub struct UplinkProbe {
    pub frames: Arc<Mutex<Vec<Vec<u8>>>>,
    pub terminations: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl UplinkProbe {
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct RecordingUplink {
    probe: UplinkProbe,
    /// Fail the send attempted after this many successful frames
    fail_after: Option<usize>,
}

impl RecordingUplink {
    pub fn new(probe: UplinkProbe) -> Self {
        Self {
            probe,
            fail_after: None,
        }
    }

    pub fn failing_after(probe: UplinkProbe, frames: usize) -> Self {
        Self {
            probe,
            fail_after: Some(frames),
        }
    }
}

#[async_trait]
impl AudioUplink for RecordingUplink {
    async fn send_audio(&mut self, frame: Vec<u8>) -> BridgeResult<()> {
        let mut frames = self.probe.frames.lock().unwrap();
        if self.fail_after == Some(frames.len()) {
            return Err(BridgeError::Send("connection reset".to_string()));
        }
        frames.push(frame);
        Ok(())
    }

    async fn terminate(&mut self) -> BridgeResult<()> {
        self.probe.terminations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Events pushed by the test; dropping the sender ends the stream
pub struct ChannelEvents {
    rx: mpsc::UnboundedReceiver<TranscriptionEvent>,
}

#[async_trait]
impl EventSource for ChannelEvents {
    async fn receive_event(&mut self) -> BridgeResult<Option<TranscriptionEvent>> {
        Ok(self.rx.recv().await)
    }
}

pub fn channel_events() -> (mpsc::UnboundedSender<TranscriptionEvent>, Box<dyn EventSource>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Box::new(ChannelEvents { rx }))
}

/// Hands out one prepared uplink/event pair, or refuses to connect
pub struct FakeConnector {
    pieces: Mutex<Option<(Box<dyn AudioUplink>, Box<dyn EventSource>)>>,
}

impl FakeConnector {
    pub fn new(uplink: impl AudioUplink + 'static, events: Box<dyn EventSource>) -> Self {
        Self {
            pieces: Mutex::new(Some((Box::new(uplink), events))),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            pieces: Mutex::new(None),
        }
    }
}

#[async_trait]
impl UplinkConnector for FakeConnector {
    async fn open(&self) -> BridgeResult<(Box<dyn AudioUplink>, Box<dyn EventSource>)> {
        self.pieces
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BridgeError::Connect("handshake did not complete within 30s".into()))
    }
}

// ============================================================================
// Reply collaborators
// ============================================================================

/// Records every prompt and answers with a fixed reply or error
pub struct RecordingGenerator {
    prompts: mpsc::UnboundedSender<String>,
    reply: Result<String, String>,
    delay: Duration,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                prompts: tx,
                reply: Ok(reply.to_string()),
                delay: Duration::ZERO,
            },
            rx,
        )
    }

    pub fn failing(error: &str) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                prompts: tx,
                reply: Err(error.to_string()),
                delay: Duration::ZERO,
            },
            rx,
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ReplyGenerator for RecordingGenerator {
    async fn generate(&self, prior_text: &str) -> BridgeResult<String> {
        let _ = self.prompts.send(prior_text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply
            .clone()
            .map_err(BridgeError::Collaborator)
    }
}

/// Records every call update as (call_id, twiml)
pub struct RecordingCallControl {
    updates: mpsc::UnboundedSender<(String, String)>,
    fail: bool,
}

impl RecordingCallControl {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { updates: tx, fail: false }, rx)
    }

    pub fn failing() -> (Self, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { updates: tx, fail: true }, rx)
    }
}

#[async_trait]
impl CallControl for RecordingCallControl {
    async fn update_call(&self, call_id: &str, twiml: &str) -> BridgeResult<()> {
        let _ = self.updates.send((call_id.to_string(), twiml.to_string()));
        if self.fail {
            return Err(BridgeError::Collaborator("call update returned 404".into()));
        }
        Ok(())
    }
}

pub fn orchestrator(
    generator: impl ReplyGenerator + 'static,
    call_control: Option<Arc<dyn CallControl>>,
) -> Arc<ReplyOrchestrator> {
    Arc::new(ReplyOrchestrator::new(
        Arc::new(generator),
        call_control,
        &ReplyConfig::default(),
        CONTINUE_URL,
    ))
}

/// Wait up to one second for the next item
pub async fn next_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Option<T> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Assert nothing arrives within a short window
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    if let Ok(Some(item)) = got {
        panic!("unexpected item: {:?}", item);
    }
}
