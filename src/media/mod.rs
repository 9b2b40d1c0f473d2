//! Call-audio media stream handling
//!
//! - `messages`: the JSON envelope format (`start` / `media` / `stop`)
//! - `transport`: the duplex stream the envelopes arrive on
//! - `ingress`: the per-leg loop relaying audio to transcription

pub mod ingress;
pub mod messages;
pub mod transport;

pub use ingress::{IngressExit, IngressSummary, MediaIngress};
pub use messages::{MediaEnvelope, MediaPayload, StartMetadata, CALL_ID_PARAMETER};
pub use transport::{MediaTransport, WebSocketTransport};
