//! Event channels.
//!
//! - **Bubble** - node-targeted events walking up the document tree
//! - **Broadcast** - window-level events delivered to every listener
//! - **Microtask** - work deferred until the current input event finishes

pub mod bubble;
pub mod broadcast;
mod microtask;

pub use bubble::{BubbleEvent, EventContext, Propagation};
pub use broadcast::{broadcast, on_broadcast, BroadcastEvent};
pub use microtask::*;
