//! Node lifecycle.
//!
//! ```text
//! Unattached ──connect──▶ Initializing ──▶ Live ⇄ Detached
//!      │                                     │        │
//!      └──────────────── destroy ────────────┴────────┴──▶ Destroyed
//! ```
//!
//! Initialization happens once, on the first connection. Later connections
//! only re-run setup.

use std::cell::Cell;

use serde::Serialize;

use crate::error::{FormError, Result};
use crate::types::NodeId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    #[default]
    Unattached,
    Initializing,
    Live,
    Detached,
    Destroyed,
}

/// What a connection has to do, given the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connect {
    /// First connection: initialize, then set up.
    Initialize,
    /// Reinsertion after a move: set up only.
    Reconnect,
    /// Already connected; nothing to do.
    AlreadyLive,
}

impl Lifecycle {
    pub fn is_live(self) -> bool {
        self == Lifecycle::Live
    }

    fn allows(self, next: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, next),
            (Unattached, Initializing)
                | (Initializing, Live)
                | (Live, Detached)
                | (Detached, Live)
                | (Unattached | Initializing | Live | Detached, Destroyed)
        )
    }
}

/// A node's lifecycle state with checked transitions.
#[derive(Debug)]
pub struct LifecycleCell {
    node: NodeId,
    state: Cell<Lifecycle>,
}

impl LifecycleCell {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            state: Cell::new(Lifecycle::Unattached),
        }
    }

    pub fn get(&self) -> Lifecycle {
        self.state.get()
    }

    pub fn transition(&self, next: Lifecycle) -> Result<()> {
        let current = self.state.get();
        if !current.allows(next) {
            return Err(FormError::InvalidTransition {
                node: self.node,
                from: current,
                to: next,
            });
        }
        self.state.set(next);
        Ok(())
    }

    pub fn begin_connect(&self) -> Result<Connect> {
        match self.state.get() {
            Lifecycle::Unattached => {
                self.transition(Lifecycle::Initializing)?;
                Ok(Connect::Initialize)
            }
            Lifecycle::Detached => Ok(Connect::Reconnect),
            Lifecycle::Live | Lifecycle::Initializing => Ok(Connect::AlreadyLive),
            Lifecycle::Destroyed => self.transition(Lifecycle::Live).map(|_| Connect::AlreadyLive),
        }
    }
}
