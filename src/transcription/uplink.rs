use async_trait::async_trait;

use super::messages::TranscriptionEvent;
use crate::error::BridgeResult;

/// Outbound half of a transcription connection: raw audio frames go up
#[async_trait]
pub trait AudioUplink: Send {
    /// Send one binary audio frame verbatim
    async fn send_audio(&mut self, frame: Vec<u8>) -> BridgeResult<()>;

    /// Ask the backend to end the session
    async fn terminate(&mut self) -> BridgeResult<()>;

    /// Close the connection
    async fn close(&mut self) -> BridgeResult<()>;
}

/// Inbound half of a transcription connection: decoded events come down
#[async_trait]
pub trait EventSource: Send {
    /// Next decoded event, or `None` once the backend has closed the stream.
    /// Undecodable payloads are skipped by the implementation.
    async fn receive_event(&mut self) -> BridgeResult<Option<TranscriptionEvent>>;
}

/// Opens one transcription connection per media leg
#[async_trait]
pub trait UplinkConnector: Send + Sync {
    async fn open(&self) -> BridgeResult<(Box<dyn AudioUplink>, Box<dyn EventSource>)>;
}
