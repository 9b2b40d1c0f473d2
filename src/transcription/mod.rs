pub mod client;
pub mod messages;
pub mod uplink;

pub use client::{TranscriptionClient, UplinkReceiver, UplinkSender};
pub use messages::{TerminateMessage, TranscriptionEvent};
pub use uplink::{AudioUplink, EventSource, UplinkConnector};
