use tracing::warn;

use crate::media::MediaTransport;
use crate::transcription::AudioUplink;

/// Close the transcription uplink, then the media stream.
/// A failure closing one does not prevent closing the other.
pub async fn close_leg(uplink: &mut dyn AudioUplink, transport: &mut dyn MediaTransport) {
    if let Err(e) = uplink.close().await {
        warn!("Closing transcription uplink failed: {}", e);
    }
    if let Err(e) = transport.close().await {
        warn!("Closing media stream failed: {}", e);
    }
}
