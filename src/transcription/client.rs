use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::messages::{TerminateMessage, TranscriptionEvent};
use super::uplink::{AudioUplink, EventSource, UplinkConnector};
use crate::config::TranscriptionConfig;
use crate::error::{BridgeError, BridgeResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming transcription client (one connection per media leg)
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    endpoint: String,
    api_key: Option<String>,
    connect_timeout: Duration,
}

impl TranscriptionClient {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            connect_timeout: config.connect_timeout(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a connection, failing if the handshake does not finish within the timeout
    pub async fn connect(&self) -> BridgeResult<(UplinkSender, UplinkReceiver)> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BridgeError::Connect("no transcription credential configured".into()))?;

        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| BridgeError::Connect(e.to_string()))?;
        let auth = HeaderValue::from_str(api_key)
            .map_err(|e| BridgeError::Connect(format!("invalid credential header: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        info!("Connecting to transcription backend at {}", self.endpoint);

        let (stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                BridgeError::Connect(format!(
                    "handshake did not complete within {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| BridgeError::Connect(e.to_string()))?;

        info!("Connected to transcription backend");

        let (sink, stream) = stream.split();
        Ok((
            UplinkSender {
                sink,
                frames_sent: 0,
            },
            UplinkReceiver { stream },
        ))
    }
}

#[async_trait]
impl UplinkConnector for TranscriptionClient {
    async fn open(&self) -> BridgeResult<(Box<dyn AudioUplink>, Box<dyn EventSource>)> {
        let (sender, receiver) = self.connect().await?;
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

/// Write half of a transcription connection
pub struct UplinkSender {
    sink: SplitSink<WsStream, Message>,
    frames_sent: u64,
}

#[async_trait]
impl AudioUplink for UplinkSender {
    async fn send_audio(&mut self, frame: Vec<u8>) -> BridgeResult<()> {
        self.sink
            .send(Message::Binary(frame.into()))
            .await
            .map_err(|e| BridgeError::Send(e.to_string()))?;
        self.frames_sent += 1;
        Ok(())
    }

    async fn terminate(&mut self) -> BridgeResult<()> {
        let payload = serde_json::to_string(&TerminateMessage::default())
            .map_err(|e| BridgeError::Send(e.to_string()))?;
        self.sink
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| BridgeError::Send(e.to_string()))
    }

    async fn close(&mut self) -> BridgeResult<()> {
        debug!("Closing transcription uplink after {} frames", self.frames_sent);
        self.sink
            .close()
            .await
            .map_err(|e| BridgeError::Send(e.to_string()))
    }
}

/// Read half of a transcription connection
pub struct UplinkReceiver {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl EventSource for UplinkReceiver {
    async fn receive_event(&mut self) -> BridgeResult<Option<TranscriptionEvent>> {
        loop {
            let decoded = match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(BridgeError::Receive(e.to_string())),
                Some(Ok(Message::Text(text))) => serde_json::from_str::<TranscriptionEvent>(&text),
                Some(Ok(Message::Binary(bytes))) => {
                    serde_json::from_slice::<TranscriptionEvent>(&bytes)
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Transcription backend closed the connection: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(_)) => continue,
            };

            match decoded {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    // Control frames are JSON; anything else is dropped.
                    warn!("Skipping undecodable transcription payload: {}", e);
                }
            }
        }
    }
}
