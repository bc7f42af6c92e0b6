//! Core types shared across the designer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cleanup returned by handler registrations and view setup.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// NodeId
// =============================================================================

/// Index of a node in the designer registry.
///
/// Indices are recycled after a node is destroyed, so a `NodeId` must not be
/// held across the destruction of the node it names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// NodeKind
// =============================================================================

/// The three kinds of node in a form document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Canvas,
    Section,
    Field,
}

impl NodeKind {
    /// Whether a node of `child` kind may live directly inside `self`.
    pub fn accepts(self, child: NodeKind) -> bool {
        matches!(
            (self, child),
            (NodeKind::Canvas, NodeKind::Section) | (NodeKind::Section, NodeKind::Field)
        )
    }
}

// =============================================================================
// InsertPosition
// =============================================================================

/// Where a drop zone inserts relative to its owning node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertPosition {
    #[serde(rename = "beforebegin")]
    BeforeBegin,
    #[serde(rename = "afterend")]
    AfterEnd,
}

impl InsertPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            InsertPosition::BeforeBegin => "beforebegin",
            InsertPosition::AfterEnd => "afterend",
        }
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsertPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforebegin" => Ok(InsertPosition::BeforeBegin),
            "afterend" => Ok(InsertPosition::AfterEnd),
            other => Err(format!("unknown insert location `{other}`")),
        }
    }
}

/// Where a structural edit puts a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Last child of the container.
    Append(NodeId),
    /// Next to a sibling.
    Adjacent {
        target: NodeId,
        position: InsertPosition,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment_rules() {
        assert!(NodeKind::Canvas.accepts(NodeKind::Section));
        assert!(NodeKind::Section.accepts(NodeKind::Field));
        assert!(!NodeKind::Canvas.accepts(NodeKind::Field));
        assert!(!NodeKind::Section.accepts(NodeKind::Section));
        assert!(!NodeKind::Field.accepts(NodeKind::Field));
    }

    #[test]
    fn test_insert_position_tags() {
        assert_eq!("beforebegin".parse::<InsertPosition>(), Ok(InsertPosition::BeforeBegin));
        assert_eq!(InsertPosition::AfterEnd.to_string(), "afterend");
        assert!("afterbegin".parse::<InsertPosition>().is_err());
    }
}
