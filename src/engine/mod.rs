//! Designer Engine - node registry, document tree and lifecycle.
//!
//! - Registry: index allocation, id mapping, element id generation
//! - Tree: parent/child links in document order
//! - Lifecycle: checked node state transitions
//!
//! # Architecture
//!
//! Nodes are indices. The registry hands them out, the tree links them, and
//! the node store (see [`crate::nodes`]) maps each index to its view state:
//!
//! ```text
//! #0 Canvas   (parent=none)
//! #1 Section  (parent=#0, id=TF-00001)
//! #2 Field    (parent=#1, id=TF-00002)
//! ```

mod lifecycle;
mod registry;
pub mod tree;

pub use lifecycle::*;
pub use registry::*;
