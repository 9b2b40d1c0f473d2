//! Reply path: text generation, call-control mutation, per-call ordering
//!
//! An end-of-turn produces a `TurnCompleted` that is queued on the call's
//! `ReplyQueue`. Its worker asks the `ReplyGenerator` for text (falling back
//! to a fixed phrase) and pushes "say this, then redirect back into the
//! stream" through `CallControl`.

pub mod call_control;
pub mod generator;
pub mod orchestrator;
pub mod worker;

pub use call_control::{CallControl, TwilioCallControl};
pub use generator::{trailing_window, CannedReply, ChatCompletionsGenerator, ReplyGenerator};
pub use orchestrator::{ReplyOrchestrator, ReplyOutcome, CONTINUE_PATH};
pub use worker::{ReplyQueue, TurnCompleted};
