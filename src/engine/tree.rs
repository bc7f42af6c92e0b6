//! Document tree - parent/child links between designer nodes.
//!
//! The canvas holds sections and sections hold fields. Children are kept in
//! document order; the order of a section's children is the order its
//! fields appear in the form.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{FormError, Result};
use crate::types::{InsertPosition, NodeId, NodeKind, Placement};

struct TreeEntry {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

thread_local! {
    static TREE: RefCell<HashMap<NodeId, TreeEntry>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Membership
// =============================================================================

/// Register a detached node.
pub fn insert_node(node: NodeId, kind: NodeKind) {
    TREE.with(|tree| {
        tree.borrow_mut().insert(
            node,
            TreeEntry {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
    });
}

/// Forget a node. Any remaining link to its parent is cut first.
pub fn remove_node(node: NodeId) {
    unlink(node);
    TREE.with(|tree| {
        let mut tree = tree.borrow_mut();
        if let Some(entry) = tree.remove(&node) {
            for child in entry.children {
                if let Some(child) = tree.get_mut(&child) {
                    child.parent = None;
                }
            }
        }
    });
}

pub fn kind_of(node: NodeId) -> Option<NodeKind> {
    TREE.with(|tree| tree.borrow().get(&node).map(|entry| entry.kind))
}

// =============================================================================
// Queries
// =============================================================================

pub fn parent_of(node: NodeId) -> Option<NodeId> {
    TREE.with(|tree| tree.borrow().get(&node).and_then(|entry| entry.parent))
}

pub fn children_of(node: NodeId) -> Vec<NodeId> {
    TREE.with(|tree| {
        tree.borrow()
            .get(&node)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    })
}

pub fn child_position(container: NodeId, child: NodeId) -> Option<usize> {
    TREE.with(|tree| {
        tree.borrow()
            .get(&container)
            .and_then(|entry| entry.children.iter().position(|c| *c == child))
    })
}

/// Parent chain of `node`, nearest first.
pub fn ancestors(node: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = parent_of(node);
    while let Some(parent) = current {
        chain.push(parent);
        current = parent_of(parent);
    }
    chain
}

/// Whether `node` is `ancestor` or lies inside it.
pub fn contains(ancestor: NodeId, node: NodeId) -> bool {
    node == ancestor || ancestors(node).contains(&ancestor)
}

/// Walk up from `node` to the root.
pub fn root_of(node: NodeId) -> NodeId {
    ancestors(node).last().copied().unwrap_or(node)
}

// =============================================================================
// Mutation
// =============================================================================

/// Container and child index a placement refers to right now.
pub fn resolve(placement: Placement) -> Result<(NodeId, usize)> {
    match placement {
        Placement::Append(container) => {
            if kind_of(container).is_none() {
                return Err(FormError::UnknownNode(container));
            }
            Ok((container, children_of(container).len()))
        }
        Placement::Adjacent { target, position } => {
            if kind_of(target).is_none() {
                return Err(FormError::UnknownNode(target));
            }
            let container = parent_of(target).ok_or(FormError::NodeNotLive(target))?;
            let index = child_position(container, target).ok_or(FormError::NodeNotLive(target))?;
            let index = match position {
                InsertPosition::BeforeBegin => index,
                InsertPosition::AfterEnd => index + 1,
            };
            Ok((container, index))
        }
    }
}

/// Insert a detached `node` as child `index` of `container`.
pub fn link(node: NodeId, container: NodeId, index: usize) -> Result<()> {
    TREE.with(|tree| {
        let mut tree = tree.borrow_mut();
        let kind = tree.get(&node).ok_or(FormError::UnknownNode(node))?.kind;
        let parent = tree.get_mut(&container).ok_or(FormError::UnknownNode(container))?;
        if !parent.kind.accepts(kind) {
            return Err(FormError::InvalidDropTarget(format!(
                "a {kind:?} cannot be placed inside a {:?}",
                parent.kind
            )));
        }
        let index = index.min(parent.children.len());
        parent.children.insert(index, node);
        if let Some(entry) = tree.get_mut(&node) {
            entry.parent = Some(container);
        }
        Ok(())
    })
}

/// Detach `node` from its parent. Returns the former parent.
pub fn unlink(node: NodeId) -> Option<NodeId> {
    TREE.with(|tree| {
        let mut tree = tree.borrow_mut();
        let parent = tree.get_mut(&node)?.parent.take()?;
        if let Some(entry) = tree.get_mut(&parent) {
            entry.children.retain(|child| *child != node);
        }
        Some(parent)
    })
}

pub fn reset_tree() {
    TREE.with(|tree| tree.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(index: usize, kind: NodeKind) -> NodeId {
        let id = NodeId(index);
        insert_node(id, kind);
        id
    }

    #[test]
    fn test_link_respects_containment() {
        reset_tree();
        let canvas = node(0, NodeKind::Canvas);
        let field = node(1, NodeKind::Field);

        assert!(matches!(link(field, canvas, 0), Err(FormError::InvalidDropTarget(_))));
        assert_eq!(parent_of(field), None);
    }

    #[test]
    fn test_adjacent_placement_resolves_to_sibling_index() {
        reset_tree();
        let section = node(0, NodeKind::Section);
        let a = node(1, NodeKind::Field);
        let b = node(2, NodeKind::Field);
        link(a, section, 0).unwrap();
        link(b, section, 1).unwrap();

        let before_b = Placement::Adjacent { target: b, position: InsertPosition::BeforeBegin };
        let after_b = Placement::Adjacent { target: b, position: InsertPosition::AfterEnd };
        assert_eq!(resolve(before_b), Ok((section, 1)));
        assert_eq!(resolve(after_b), Ok((section, 2)));
        assert_eq!(resolve(Placement::Append(section)), Ok((section, 2)));
    }

    #[test]
    fn test_unlink_and_contains() {
        reset_tree();
        let canvas = node(0, NodeKind::Canvas);
        let section = node(1, NodeKind::Section);
        let field = node(2, NodeKind::Field);
        link(section, canvas, 0).unwrap();
        link(field, section, 0).unwrap();

        assert!(contains(canvas, field));
        assert!(contains(field, field));
        assert_eq!(ancestors(field), vec![section, canvas]);
        assert_eq!(root_of(field), canvas);

        assert_eq!(unlink(field), Some(section));
        assert!(children_of(section).is_empty());
        assert!(!contains(canvas, field));
        assert_eq!(unlink(field), None);
    }

    #[test]
    fn test_detached_target_cannot_anchor_placement() {
        reset_tree();
        let field = node(0, NodeKind::Field);
        let placement = Placement::Adjacent { target: field, position: InsertPosition::AfterEnd };
        assert_eq!(resolve(placement), Err(FormError::NodeNotLive(field)));
    }
}
