use super::state::AppState;
use crate::bridge::run_call_leg;
use crate::config::Config;
use crate::media::{WebSocketTransport, CALL_ID_PARAMETER};
use crate::twiml::{Stream, VoiceResponse};
use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::info;

/// Path of the media stream WebSocket
pub const MEDIA_PATH: &str = "/media";

// ============================================================================
// Request Types
// ============================================================================

/// Voice webhook form posted by the telephony platform when a call arrives
#[derive(Debug, Default, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,
}

/// `?callSid=` on the re-entry webhook and the media stream
#[derive(Debug, Default, Deserialize)]
pub struct CallParams {
    #[serde(rename = "callSid", alias = "CallSid", default)]
    pub call_sid: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// WebSocket URL the platform streams call audio to
pub fn media_stream_url(config: &Config, call_id: &str) -> String {
    let base = format!("{}{}", config.service.ws_base(), MEDIA_PATH);
    match reqwest::Url::parse_with_params(&base, &[(CALL_ID_PARAMETER, call_id)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?{}={}", base, CALL_ID_PARAMETER, call_id),
    }
}

fn stream_block(config: &Config, call_id: &str) -> Stream {
    Stream::new(media_stream_url(config, call_id)).parameter(CALL_ID_PARAMETER, call_id)
}

fn twiml_response(doc: VoiceResponse) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        doc.to_xml(),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /voice
/// Start streaming a new call and greet the caller
pub async fn voice(State(state): State<AppState>, Form(form): Form<VoiceWebhook>) -> Response {
    let config = &state.config;
    let stream = stream_block(config, &form.call_sid);
    info!("[VOICE] callSid={} streaming to {}", form.call_sid, stream.url);

    let doc = VoiceResponse::new()
        .connect_stream(stream)
        .say(&config.greeting.text, Some(config.greeting.language.as_str()))
        .pause(config.greeting.pause_secs);

    twiml_response(doc)
}

/// GET|POST /voice_stream_continue?callSid=...
/// Re-open the media stream after a spoken reply
pub async fn voice_stream_continue(
    State(state): State<AppState>,
    Query(params): Query<CallParams>,
) -> Response {
    let config = &state.config;
    let stream = stream_block(config, &params.call_sid);
    info!("[VOICE_CONTINUE] re-opening stream for {}", params.call_sid);

    let doc = VoiceResponse::new()
        .connect_stream(stream)
        .pause(config.greeting.pause_secs);

    twiml_response(doc)
}

/// GET /media?callSid=... (WebSocket)
/// One media leg of a call
pub async fn media_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<CallParams>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let transport = WebSocketTransport::new(socket);
        run_call_leg(&state.bridge, &params.call_sid, transport).await;
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
