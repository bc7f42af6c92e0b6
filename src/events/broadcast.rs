//! Broadcast Events - window-level notifications every live node can hear.
//!
//! Drag gestures announce themselves here so that drop zones across the
//! whole document can show or hide at once. Pointer presses are broadcast
//! so nodes can drop their active highlight when the press lands elsewhere.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::types::NodeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastEvent {
    /// A palette item is being dragged.
    CreatingField { tag: String },
    CreatedField,
    MovingField { node: NodeId },
    MovedField { node: NodeId },
    MovingSection { node: NodeId },
    MovedSection { node: NodeId },
    /// A pointer press landed on `target` (or on nothing).
    PointerDown { target: Option<NodeId> },
}

impl BroadcastEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::CreatingField { .. } => "creating-field",
            BroadcastEvent::CreatedField => "created-field",
            BroadcastEvent::MovingField { .. } => "moving-field",
            BroadcastEvent::MovedField { .. } => "moved-field",
            BroadcastEvent::MovingSection { .. } => "moving-section",
            BroadcastEvent::MovedSection { .. } => "moved-section",
            BroadcastEvent::PointerDown { .. } => "pointerdown",
        }
    }
}

pub type BroadcastHandler = Rc<dyn Fn(&BroadcastEvent)>;

thread_local! {
    static LISTENERS: RefCell<Vec<(usize, BroadcastHandler)>> = const { RefCell::new(Vec::new()) };
    static NEXT_ID: RefCell<usize> = const { RefCell::new(0) };
}

/// Listen to every broadcast. Returns a cleanup that unregisters.
pub fn on_broadcast<F: Fn(&BroadcastEvent) + 'static>(handler: F) -> impl FnOnce() {
    let id = NEXT_ID.with(|next| {
        let mut next = next.borrow_mut();
        let id = *next;
        *next += 1;
        id
    });
    LISTENERS.with(|listeners| listeners.borrow_mut().push((id, Rc::new(handler))));

    move || {
        LISTENERS.with(|listeners| listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id));
    }
}

/// Deliver `event` to every listener registered when the call starts.
pub fn broadcast(event: BroadcastEvent) {
    let listeners: Vec<BroadcastHandler> =
        LISTENERS.with(|listeners| listeners.borrow().iter().map(|(_, h)| h.clone()).collect());
    trace!(event = event.name(), listeners = listeners.len(), "broadcasting");
    for listener in listeners {
        listener(&event);
    }
}

pub fn listener_count() -> usize {
    LISTENERS.with(|listeners| listeners.borrow().len())
}

pub fn reset_broadcast() {
    LISTENERS.with(|listeners| listeners.borrow_mut().clear());
    NEXT_ID.with(|next| *next.borrow_mut() = 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_listeners_hear_broadcast() {
        reset_broadcast();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        let _a = on_broadcast(move |event| l.borrow_mut().push(("a", event.name())));
        let l = log.clone();
        let _b = on_broadcast(move |event| l.borrow_mut().push(("b", event.name())));

        broadcast(BroadcastEvent::CreatedField);
        assert_eq!(*log.borrow(), vec![("a", "created-field"), ("b", "created-field")]);
    }

    #[test]
    fn test_unsubscribe_mid_broadcast_is_safe() {
        reset_broadcast();
        let cleanup: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(RefCell::new(0));

        let (c, h) = (cleanup.clone(), hits.clone());
        let remove = on_broadcast(move |_| {
            *h.borrow_mut() += 1;
            if let Some(cleanup) = c.borrow_mut().take() {
                cleanup();
            }
        });
        *cleanup.borrow_mut() = Some(Box::new(remove));

        broadcast(BroadcastEvent::PointerDown { target: None });
        broadcast(BroadcastEvent::PointerDown { target: None });
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(listener_count(), 0);
    }
}
