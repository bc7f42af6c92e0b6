//! Structural edits: attach, move, remove and duplicate nodes.
//!
//! Every edit is validated before the tree is touched, so a rejected edit
//! leaves the document exactly as it was.

use tracing::{debug, warn};

use super::canvas::canvas_of;
use super::field::FieldNode;
use super::section::SectionNode;
use super::store::{self, Node};
use super::view::slots;
use crate::engine::{self, tree};
use crate::error::{FormError, Result};
use crate::reactive::{ReactiveObject, Value};
use crate::state::animate::{animate_exit, animation_kind, AnimationKind};
use crate::types::{InsertPosition, NodeId, NodeKind, Placement};

/// Check that a node of `kind` (already existing as `node`, if any) may be
/// placed at `placement`. Returns the receiving container.
pub fn validate_placement(kind: NodeKind, node: Option<NodeId>, placement: Placement) -> Result<NodeId> {
    let container = match placement {
        Placement::Append(container) => container,
        Placement::Adjacent { target, .. } => {
            if Some(target) == node {
                return Err(FormError::SelfDrop(target));
            }
            if tree::kind_of(target).is_none() {
                return Err(FormError::UnknownNode(target));
            }
            tree::parent_of(target).ok_or(FormError::NodeNotLive(target))?
        }
    };

    let container_kind = tree::kind_of(container).ok_or(FormError::UnknownNode(container))?;
    if !container_kind.accepts(kind) {
        return Err(FormError::InvalidDropTarget(format!(
            "a {kind:?} cannot be placed inside a {container_kind:?}"
        )));
    }
    if let Some(node) = node
        && tree::contains(node, container)
    {
        return Err(FormError::InvalidDropTarget(format!("{node} cannot be placed inside itself")));
    }
    if container_kind != NodeKind::Canvas && !store::get_node(container).is_some_and(|c| c.is_live()) {
        return Err(FormError::NodeNotLive(container));
    }
    // A container on its way out takes no new children.
    if is_exiting(container) {
        return Err(FormError::NodeNotLive(container));
    }
    Ok(container)
}

/// Place a freshly created node and connect it.
///
/// On any failure the node is destroyed and the document is unchanged.
pub fn attach(node: &Node, placement: Placement) -> Result<()> {
    let id = node.node_id();
    let result = validate_placement(node.kind(), Some(id), placement)
        .and_then(|_| tree::resolve(placement))
        .and_then(|(container, index)| tree::link(id, container, index))
        .and_then(|_| node.connect());

    if let Err(err) = result {
        warn!(node = %id, %err, "attach failed; discarding node");
        tree::unlink(id);
        engine::release_index(id);
        return Err(err);
    }
    debug!(node = %id, ?placement, "node attached");
    Ok(())
}

/// Move a live node to `placement`.
///
/// Emits the node's remove event, relinks it, then emits its add event.
/// A move to the node's current position still does both.
pub fn move_node(node_id: NodeId, placement: Placement) -> Result<()> {
    let node = store::get_node(node_id).ok_or(FormError::UnknownNode(node_id))?;
    if !node.is_live() || is_exiting(node_id) {
        return Err(FormError::NodeNotLive(node_id));
    }
    validate_placement(node.kind(), Some(node_id), placement)?;

    let origin = tree::parent_of(node_id)
        .and_then(|parent| tree::child_position(parent, node_id).map(|index| (parent, index)));

    node.disconnect();
    tree::unlink(node_id);

    let result = tree::resolve(placement)
        .and_then(|(container, index)| tree::link(node_id, container, index))
        .and_then(|_| node.connect());

    if let Err(err) = result {
        warn!(node = %node_id, %err, "move failed; restoring");
        tree::unlink(node_id);
        if let Some((parent, index)) = origin {
            tree::link(node_id, parent, index)?;
            node.connect()?;
        }
        return Err(err);
    }
    debug!(node = %node_id, ?placement, "node moved");
    Ok(())
}

/// Start `node`'s exit transition; detach and destroy it when it ends.
pub fn remove_node(node_id: NodeId, duration_ms: u64) {
    let Some(node) = store::get_node(node_id) else { return };
    let id = node.id();
    node.view().set_flag(slots::EXITING, true);

    animate_exit(node_id, duration_ms, move || {
        // The index may have been recycled if an ancestor went first.
        if engine::get_id(node_id).as_deref() == Some(id.as_str()) {
            detach_and_destroy(node_id);
        }
    });
}

/// Whether `node` has started its exit transition.
pub fn is_exiting(node: NodeId) -> bool {
    animation_kind(node) == Some(AnimationKind::Exit)
}

/// Detach `node` and release it with everything inside it.
///
/// Descendants are disconnected innermost first, so each one emits its
/// remove event while the tree above it is still intact.
pub fn detach_and_destroy(node_id: NodeId) {
    disconnect_subtree(node_id);
    tree::unlink(node_id);
    engine::release_index(node_id);
}

fn disconnect_subtree(node_id: NodeId) {
    for child in tree::children_of(node_id) {
        disconnect_subtree(child);
    }
    if let Some(node) = store::get_node(node_id) {
        node.disconnect();
    }
}

// =============================================================================
// Duplication
// =============================================================================

/// Copy every attribute except the id.
fn copy_attributes(from: &ReactiveObject, to: &ReactiveObject) {
    for name in from.field_names() {
        if name == "id" {
            continue;
        }
        if let Ok(value) = from.peek(&name) {
            to.set(&name, Value::from_json(&value.to_json_untracked()));
        }
    }
}

/// Insert a copy of `field` right after it.
pub fn duplicate_field(field: &FieldNode) -> Result<FieldNode> {
    let canvas = canvas_of(field.node_id()).ok_or(FormError::NodeNotLive(field.node_id()))?;
    let copy = canvas.create_field(field.tag())?;
    copy_attributes(field.data(), copy.data());
    attach(
        &Node::Field(copy.clone()),
        Placement::Adjacent {
            target: field.node_id(),
            position: InsertPosition::AfterEnd,
        },
    )?;
    Ok(copy)
}

/// Insert a copy of `section`, with copies of all its fields, right after it.
pub fn duplicate_section(section: &SectionNode) -> Result<SectionNode> {
    let canvas = canvas_of(section.node_id()).ok_or(FormError::NodeNotLive(section.node_id()))?;
    let copy = canvas.create_section()?;
    copy_attributes(section.data(), copy.data());
    attach(
        &Node::Section(copy.clone()),
        Placement::Adjacent {
            target: section.node_id(),
            position: InsertPosition::AfterEnd,
        },
    )?;

    for field in section.fields() {
        let duplicate = canvas.create_field(field.tag())?;
        copy_attributes(field.data(), duplicate.data());
        attach(&Node::Field(duplicate), Placement::Append(copy.node_id()))?;
    }
    Ok(copy)
}
