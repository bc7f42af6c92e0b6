//! Pointer state - hover tracking, presses and wheel events.
//!
//! The host hit-tests its own rendering and reports which node is under the
//! pointer. Hover shows the highlight of that node and of every section
//! around it; a press pins the pressed node as the edit target and tells
//! everyone else (via a `PointerDown` broadcast) to let go.
//!
//! # API
//!
//! - `pointer_move(target)` - the pointer is now over `target`
//! - `pointer_leave()` - the pointer left the canvas
//! - `pointer_down(target)` - press on `target` (or outside any node)
//! - `hovered()` - node under the pointer (tracked)

use std::collections::HashSet;

use tracing::trace;

use super::keyboard::Modifiers;
use crate::engine::tree;
use crate::events::{broadcast, BroadcastEvent};
use crate::nodes::get_node;
use crate::reactive::Reactive;
use crate::types::NodeId;

/// Wheel event
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelEvent {
    pub delta_x: f64,
    pub delta_y: f64,
    pub modifiers: Modifiers,
}

impl WheelEvent {
    pub fn new(delta_x: f64, delta_y: f64) -> Self {
        Self {
            delta_x,
            delta_y,
            modifiers: Modifiers::empty(),
        }
    }
}

thread_local! {
    static HOVERED: Reactive<Option<NodeId>> = Reactive::new(None);
}

/// Node under the pointer.
pub fn hovered() -> Option<NodeId> {
    HOVERED.with(Reactive::get)
}

/// `node` and every enclosing section or field.
fn hover_chain(node: Option<NodeId>) -> Vec<NodeId> {
    let Some(node) = node else { return Vec::new() };
    std::iter::once(node)
        .chain(tree::ancestors(node))
        .filter(|node| get_node(*node).is_some())
        .collect()
}

pub fn pointer_move(target: Option<NodeId>) {
    let previous = HOVERED.with(Reactive::get_untracked);
    if previous == target {
        return;
    }
    let before = hover_chain(previous);
    let after = hover_chain(target);
    let kept: HashSet<NodeId> = after.iter().copied().collect();
    let entered: HashSet<NodeId> = before.iter().copied().collect();

    for node in before.iter().filter(|node| !kept.contains(node)) {
        if let Some(node) = get_node(*node) {
            node.highlight().pointer_leave();
        }
    }
    for node in after.iter().filter(|node| !entered.contains(node)) {
        if let Some(node) = get_node(*node) {
            node.highlight().pointer_enter();
        }
    }
    trace!(?previous, ?target, "hover moved");
    HOVERED.with(|hovered| hovered.set(target));
}

pub fn pointer_leave() {
    pointer_move(None);
}

/// Press on `target`. Every node not containing it drops its active marker;
/// the pressed node becomes the edit target.
pub fn pointer_down(target: Option<NodeId>) {
    broadcast(BroadcastEvent::PointerDown { target });
    if let Some(node) = target.and_then(get_node) {
        node.send_edit_event();
    }
}

pub fn reset_pointer() {
    HOVERED.with(|hovered| hovered.set(None));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesignerConfig;
    use crate::fields::register_builtin_fields;
    use crate::nodes::Canvas;
    use crate::types::Placement;

    fn setup() -> (Canvas, NodeId, NodeId) {
        crate::reset_designer();
        register_builtin_fields();
        let canvas = Canvas::new(DesignerConfig::default()).unwrap();
        let section = canvas.add_section().unwrap();
        let field = canvas.insert_field("text", Placement::Append(section.node_id())).unwrap();
        (canvas, section.node_id(), field.node_id())
    }

    fn outline(node: NodeId) -> bool {
        get_node(node).is_some_and(|node| node.highlight().is_visible())
    }

    #[test]
    fn test_hover_covers_enclosing_section() {
        let (_canvas, section, field) = setup();
        pointer_down(None);

        pointer_move(Some(field));
        assert_eq!(hovered(), Some(field));
        assert!(outline(field));
        assert!(outline(section));

        pointer_move(Some(section));
        assert!(!outline(field));
        assert!(outline(section));

        pointer_leave();
        assert!(!outline(section));
        assert_eq!(hovered(), None);
    }

    #[test]
    fn test_press_moves_edit_target() {
        let (canvas, section, field) = setup();
        assert_eq!(canvas.edit_target(), Some(field));

        pointer_down(Some(section));
        assert_eq!(canvas.edit_target(), Some(section));
        assert!(get_node(section).unwrap().highlight().is_active());
        assert!(!get_node(field).unwrap().highlight().is_active());
    }
}
