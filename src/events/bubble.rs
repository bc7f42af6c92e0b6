//! Bubbling Events - dispatched at a node, delivered up its parent chain.
//!
//! A handler registered on a node sees every event dispatched at that node
//! or at any of its descendants. Handlers return [`Propagation::Stop`] to
//! keep the event from reaching ancestors.
//!
//! # Example
//!
//! ```ignore
//! use form_designer::events::bubble::{self, BubbleEvent, Propagation};
//!
//! let cleanup = bubble::on_node(section, |event, _cx| {
//!     if let BubbleEvent::AddField { id, .. } = event {
//!         println!("field {id} joined the section");
//!     }
//!     Propagation::Continue
//! });
//!
//! bubble::dispatch(field, BubbleEvent::EditField { field });
//! cleanup();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::engine::tree;
use crate::reactive::ReactiveObject;
use crate::types::NodeId;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Debug)]
pub enum BubbleEvent {
    /// A field became live inside a container.
    AddField {
        field: NodeId,
        id: String,
        data: ReactiveObject,
    },
    /// A field is about to leave its container.
    RemoveField { field: NodeId, id: String },
    AddSection {
        section: NodeId,
        id: String,
        data: ReactiveObject,
    },
    RemoveSection { section: NodeId, id: String },
    /// The user confirmed deleting `origin`.
    Delete { origin: NodeId },
    /// The user confirmed duplicating `origin`.
    Copy { origin: NodeId },
    /// A section is discarding one of its fields along with itself.
    DeleteField { id: String },
    /// A field asked to become the edit target.
    EditField { field: NodeId },
    EditSection { section: NodeId },
}

impl BubbleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BubbleEvent::AddField { .. } => "add-field",
            BubbleEvent::RemoveField { .. } => "remove-field",
            BubbleEvent::AddSection { .. } => "add-section",
            BubbleEvent::RemoveSection { .. } => "remove-section",
            BubbleEvent::Delete { .. } => "delete",
            BubbleEvent::Copy { .. } => "copy",
            BubbleEvent::DeleteField { .. } => "delete-field",
            BubbleEvent::EditField { .. } => "edit-field",
            BubbleEvent::EditSection { .. } => "edit-section",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

/// Where an event is in its walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventContext {
    /// Node the event was dispatched at.
    pub target: NodeId,
    /// Node whose handler is running.
    pub current: NodeId,
}

pub type BubbleHandler = Rc<dyn Fn(&BubbleEvent, &EventContext) -> Propagation>;

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct HandlerRegistry {
    handlers: HashMap<NodeId, Vec<(usize, BubbleHandler)>>,
    next_id: usize,
}

thread_local! {
    static REGISTRY: RefCell<HandlerRegistry> = RefCell::new(HandlerRegistry {
        handlers: HashMap::new(),
        next_id: 0,
    });
}

/// Listen for events reaching `node`. Returns a cleanup that unregisters.
pub fn on_node<F>(node: NodeId, handler: F) -> impl FnOnce()
where
    F: Fn(&BubbleEvent, &EventContext) -> Propagation + 'static,
{
    let id = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .handlers
            .entry(node)
            .or_default()
            .push((id, Rc::new(handler)));
        id
    });

    move || {
        REGISTRY.with(|registry| {
            let mut registry = registry.borrow_mut();
            if let Some(handlers) = registry.handlers.get_mut(&node) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
                if handlers.is_empty() {
                    registry.handlers.remove(&node);
                }
            }
        });
    }
}

/// Deliver `event` to `target`, then to each ancestor, until a handler stops it.
///
/// The path is fixed when dispatch starts. Handlers registered during
/// delivery on a node already visited are not called.
pub fn dispatch(target: NodeId, event: BubbleEvent) -> Propagation {
    let mut path = vec![target];
    path.extend(tree::ancestors(target));
    trace!(event = event.name(), %target, depth = path.len(), "dispatching bubbling event");

    for current in path {
        let handlers: Vec<BubbleHandler> = REGISTRY.with(|registry| {
            registry
                .borrow()
                .handlers
                .get(&current)
                .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        });

        let cx = EventContext { target, current };
        for handler in handlers {
            if handler(&event, &cx) == Propagation::Stop {
                return Propagation::Stop;
            }
        }
    }
    Propagation::Continue
}

pub fn handler_count(node: NodeId) -> usize {
    REGISTRY.with(|registry| registry.borrow().handlers.get(&node).map_or(0, Vec::len))
}

/// Drop every handler registered on `node`.
pub fn clear_node(node: NodeId) {
    REGISTRY.with(|registry| {
        registry.borrow_mut().handlers.remove(&node);
    });
}

pub fn reset_bubble_handlers() {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        registry.handlers.clear();
        registry.next_id = 0;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tree::{insert_node, link, reset_tree};
    use crate::types::NodeKind;

    fn chain() -> (NodeId, NodeId, NodeId) {
        reset_tree();
        reset_bubble_handlers();
        let (canvas, section, field) = (NodeId(0), NodeId(1), NodeId(2));
        insert_node(canvas, NodeKind::Canvas);
        insert_node(section, NodeKind::Section);
        insert_node(field, NodeKind::Field);
        link(section, canvas, 0).unwrap();
        link(field, section, 0).unwrap();
        (canvas, section, field)
    }

    fn recorder(log: &Rc<RefCell<Vec<NodeId>>>, result: Propagation) -> impl Fn(&BubbleEvent, &EventContext) -> Propagation + 'static {
        let log = log.clone();
        move |_, cx| {
            log.borrow_mut().push(cx.current);
            result
        }
    }

    #[test]
    fn test_event_walks_up_parent_chain() {
        let (canvas, section, field) = chain();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = on_node(field, recorder(&log, Propagation::Continue));
        let _b = on_node(section, recorder(&log, Propagation::Continue));
        let _c = on_node(canvas, recorder(&log, Propagation::Continue));

        let result = dispatch(field, BubbleEvent::EditField { field });
        assert_eq!(result, Propagation::Continue);
        assert_eq!(*log.borrow(), vec![field, section, canvas]);
    }

    #[test]
    fn test_stop_halts_propagation() {
        let (canvas, section, field) = chain();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = on_node(section, recorder(&log, Propagation::Stop));
        let _b = on_node(canvas, recorder(&log, Propagation::Continue));

        let result = dispatch(field, BubbleEvent::Delete { origin: field });
        assert_eq!(result, Propagation::Stop);
        assert_eq!(*log.borrow(), vec![section]);
    }

    #[test]
    fn test_cleanup_unregisters() {
        let (_, section, field) = chain();
        let log = Rc::new(RefCell::new(Vec::new()));
        let cleanup = on_node(section, recorder(&log, Propagation::Continue));
        assert_eq!(handler_count(section), 1);

        cleanup();
        dispatch(field, BubbleEvent::EditField { field });
        assert!(log.borrow().is_empty());
        assert_eq!(handler_count(section), 0);
    }

    #[test]
    fn test_handler_may_register_during_dispatch() {
        let (canvas, _, field) = chain();
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();
        let _a = on_node(canvas, move |_, _| {
            *c.borrow_mut() += 1;
            let _ = on_node(canvas, |_, _| Propagation::Continue);
            Propagation::Continue
        });

        dispatch(field, BubbleEvent::EditField { field });
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(handler_count(canvas), 2);
    }
}
