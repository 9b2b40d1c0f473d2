pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod reply;
pub mod session;
pub mod transcription;
pub mod turn;
pub mod twiml;

pub use bridge::{run_call_leg, BridgeContext, LegExit, LegSummary};
pub use config::Config;
pub use error::{BridgeError, BridgeResult};
pub use http::{create_router, AppState};
pub use media::{IngressExit, IngressSummary, MediaEnvelope, MediaIngress, MediaTransport};
pub use reply::{
    CallControl, ReplyGenerator, ReplyOrchestrator, ReplyOutcome, ReplyQueue, TurnCompleted,
};
pub use session::{CallSession, SessionRegistry};
pub use transcription::{
    AudioUplink, EventSource, TranscriptionClient, TranscriptionEvent, UplinkConnector,
};
pub use turn::{AccumulationMode, ListenerExit, TurnOutcome, TurnProcessor, TurnState};
