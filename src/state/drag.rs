//! Drag and drop - the drop-zone negotiation.
//!
//! A drag starts from the palette (payload: a field tag) or from a live node
//! (payload: the node). Starting broadcasts what is being dragged so every
//! compatible node shows its drop zones; ending broadcasts the matching
//! "done" event so they hide again.
//!
//! ```text
//! Idle ──begin(Palette)──► CreatingField(tag) ──end──► Idle   (CreatedField)
//! Idle ──begin(field)────► MovingField(node)  ──end──► Idle   (MovedField)
//! Idle ──begin(section)──► MovingSection(node)──end──► Idle   (MovedSection)
//! ```
//!
//! A drop is validated completely before anything changes: a rejected drop
//! returns an error and the document is exactly as it was.

use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::events::{broadcast, BroadcastEvent};
use crate::nodes::{get_node, is_registered, structure, Canvas, Node};
use crate::reactive::Reactive;
use crate::types::{InsertPosition, NodeId, Placement};

/// What is being dragged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragPayload {
    /// A new field of this type, from the palette.
    Palette(String),
    /// An existing section or field.
    Node(NodeId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    CreatingField(String),
    MovingField(NodeId),
    MovingSection(NodeId),
}

/// Where the pointer is when dropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropTarget {
    /// One of `node`'s drop zones.
    Zone { node: NodeId, position: InsertPosition },
    /// The body of a container; the payload is appended.
    Container(NodeId),
}

thread_local! {
    static DRAG: Reactive<DragState> = Reactive::new(DragState::Idle);
}

/// Current drag state. Tracked.
pub fn drag_state() -> DragState {
    DRAG.with(Reactive::get)
}

pub fn is_dragging() -> bool {
    DRAG.with(|drag| drag.with_untracked(|state| *state != DragState::Idle))
}

/// Start dragging `payload`. A drag already in progress is ended first.
pub fn begin_drag(payload: DragPayload) -> Result<()> {
    if is_dragging() {
        end_drag();
    }

    let (state, event) = match payload {
        DragPayload::Palette(tag) => {
            if !is_registered(&tag) {
                return Err(FormError::UnknownFieldType(tag));
            }
            (DragState::CreatingField(tag.clone()), BroadcastEvent::CreatingField { tag })
        }
        DragPayload::Node(node) => match get_node(node) {
            Some(found) if !found.is_live() => return Err(FormError::NodeNotLive(node)),
            Some(Node::Field(_)) => (DragState::MovingField(node), BroadcastEvent::MovingField { node }),
            Some(Node::Section(_)) => (DragState::MovingSection(node), BroadcastEvent::MovingSection { node }),
            None => return Err(FormError::UnknownNode(node)),
        },
    };

    debug!(?state, "drag started");
    DRAG.with(|drag| drag.set(state));
    broadcast(event);
    Ok(())
}

fn zone_of(node: NodeId, position: InsertPosition) -> Option<crate::nodes::DropZone> {
    get_node(node).map(|found| found.zones().zone(position).clone())
}

/// The pointer entered `target`; a visible zone shows its insert indicator.
pub fn drag_over(target: DropTarget) {
    if let DropTarget::Zone { node, position } = target
        && let Some(zone) = zone_of(node, position)
    {
        zone.drag_over();
    }
}

pub fn drag_leave(target: DropTarget) {
    if let DropTarget::Zone { node, position } = target
        && let Some(zone) = zone_of(node, position)
    {
        zone.drag_leave();
    }
}

/// Drop the current payload on `target`. Returns the placed node.
pub fn drop_payload(canvas: &Canvas, target: DropTarget) -> Result<NodeId> {
    let state = DRAG.with(Reactive::get_untracked);

    let placement = match target {
        DropTarget::Zone { node, position } => {
            let zone = zone_of(node, position).ok_or(FormError::UnknownNode(node))?;
            if !zone.is_visible() {
                warn!(%node, %position, "drop on a hidden zone");
                return Err(FormError::InvalidDropTarget(format!("{position} zone of {node} is not shown")));
            }
            zone.drag_leave();
            Placement::Adjacent { target: node, position }
        }
        DropTarget::Container(container) => Placement::Append(container),
    };

    let result = match state {
        DragState::Idle => Err(FormError::InvalidDropTarget("nothing is being dragged".into())),
        DragState::CreatingField(tag) => canvas.insert_field(&tag, placement).map(|field| field.node_id()),
        DragState::MovingField(node) | DragState::MovingSection(node) => {
            structure::move_node(node, placement).map(|()| node)
        }
    };

    match &result {
        Ok(node) => debug!(%node, ?placement, "dropped"),
        Err(err) => warn!(%err, ?placement, "drop rejected"),
    }
    result
}

/// Finish the drag, dropped or not. Every zone hides.
pub fn end_drag() {
    let state = DRAG.with(|drag| drag.with_untracked(Clone::clone));
    let event = match state {
        DragState::Idle => return,
        DragState::CreatingField(_) => BroadcastEvent::CreatedField,
        DragState::MovingField(node) => BroadcastEvent::MovedField { node },
        DragState::MovingSection(node) => BroadcastEvent::MovedSection { node },
    };
    DRAG.with(|drag| drag.set(DragState::Idle));
    broadcast(event);
    debug!("drag ended");
}

pub fn reset_drag() {
    DRAG.with(|drag| drag.set(DragState::Idle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesignerConfig;
    use crate::fields::register_builtin_fields;

    fn setup() -> Canvas {
        crate::reset_designer();
        register_builtin_fields();
        Canvas::new(DesignerConfig::default()).unwrap()
    }

    #[test]
    fn test_palette_drag_shows_field_zones_only() {
        let canvas = setup();
        let section = canvas.add_section().unwrap();
        let field = canvas.insert_field("text", Placement::Append(section.node_id())).unwrap();

        begin_drag(DragPayload::Palette("number".into())).unwrap();
        assert!(is_dragging());
        assert!(field.zones().any_visible());
        assert!(!section.zones().any_visible());

        let zone = DropTarget::Zone {
            node: field.node_id(),
            position: InsertPosition::BeforeBegin,
        };
        drag_over(zone);
        assert!(field.zones().zone(InsertPosition::BeforeBegin).is_indicated());
        drag_leave(zone);
        assert!(!field.zones().zone(InsertPosition::BeforeBegin).is_indicated());

        let created = drop_payload(&canvas, zone).unwrap();
        end_drag();
        assert_eq!(section.field_ids()[0], crate::engine::get_id(created).unwrap());
        assert!(!field.zones().any_visible());
        assert_eq!(drag_state(), DragState::Idle);
    }

    #[test]
    fn test_section_drag_reorders_sections() {
        let canvas = setup();
        let first = canvas.add_section().unwrap();
        let second = canvas.add_section().unwrap();

        begin_drag(DragPayload::Node(second.node_id())).unwrap();
        assert_eq!(drag_state(), DragState::MovingSection(second.node_id()));
        assert!(first.zones().any_visible());
        assert!(!second.zones().any_visible());

        let zone = DropTarget::Zone {
            node: first.node_id(),
            position: InsertPosition::BeforeBegin,
        };
        drop_payload(&canvas, zone).unwrap();
        end_drag();

        let order: Vec<NodeId> = canvas.sections().iter().map(|section| section.node_id()).collect();
        assert_eq!(order, vec![second.node_id(), first.node_id()]);
        assert!(!first.zones().any_visible());
    }

    #[test]
    fn test_invalid_drags_are_rejected() {
        let canvas = setup();
        assert!(matches!(
            drop_payload(&canvas, DropTarget::Container(canvas.root())),
            Err(FormError::InvalidDropTarget(_))
        ));

        let detached = canvas.create_field("text").unwrap();
        assert_eq!(
            begin_drag(DragPayload::Node(detached.node_id())),
            Err(FormError::NodeNotLive(detached.node_id()))
        );
        assert_eq!(
            begin_drag(DragPayload::Node(NodeId(999))),
            Err(FormError::UnknownNode(NodeId(999)))
        );
        assert!(!is_dragging());
    }
}
