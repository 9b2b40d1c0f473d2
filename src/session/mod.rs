//! Call session management
//!
//! This module provides the per-call state shared across media legs:
//! - The accumulated transcript for the call
//! - Activity timestamps used for idle eviction
//! - The call's single-worker reply queue
//! - The process-wide registry keyed by call identifier

mod call;
mod registry;

pub use call::{CallSession, FRAGMENT_SEPARATOR};
pub use registry::SessionRegistry;
