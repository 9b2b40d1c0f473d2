//! HTTP surface for the telephony platform
//!
//! - POST /voice - Incoming call webhook (greeting + media stream)
//! - GET|POST /voice_stream_continue - Re-entry after a spoken reply
//! - GET /media - Media stream WebSocket (one leg per connection)
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{media_stream_url, MEDIA_PATH};
pub use routes::create_router;
pub use state::AppState;
