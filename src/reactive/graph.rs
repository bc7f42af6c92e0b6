//! Dependency graph between reactive values and effects.
//!
//! Each reactive value owns a [`SubscriberSet`]. An effect that reads the
//! value while executing is inserted into that set, and the effect remembers
//! the set so it can remove itself before its next run. Sets hold effects
//! strongly; effects hold their sets weakly.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::types::Cleanup;

pub(crate) type EffectId = u64;
type SetId = u64;

thread_local! {
    static NEXT_EFFECT_ID: Cell<EffectId> = const { Cell::new(1) };
    static NEXT_SET_ID: Cell<SetId> = const { Cell::new(1) };
}

fn next_id(counter: &'static std::thread::LocalKey<Cell<u64>>) -> u64 {
    counter.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

// =============================================================================
// Effect node
// =============================================================================

pub(crate) struct EffectNode {
    pub(crate) id: EffectId,
    pub(crate) f: RefCell<Option<Rc<dyn Fn()>>>,
    pub(crate) dependencies: RefCell<IndexMap<SetId, Weak<SetInner>>>,
    /// Effects created while this one was executing.
    pub(crate) children: RefCell<Vec<Rc<EffectNode>>>,
    pub(crate) cleanups: RefCell<Vec<Cleanup>>,
    pub(crate) running: Cell<bool>,
    /// Notified while running; the current run is stale.
    pub(crate) dirty: Cell<bool>,
    pub(crate) disposed: Cell<bool>,
}

impl EffectNode {
    pub(crate) fn new(f: Rc<dyn Fn()>) -> Self {
        Self {
            id: next_id(&NEXT_EFFECT_ID),
            f: RefCell::new(Some(f)),
            dependencies: RefCell::new(IndexMap::new()),
            children: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            running: Cell::new(false),
            dirty: Cell::new(false),
            disposed: Cell::new(false),
        }
    }
}

// =============================================================================
// Subscriber sets
// =============================================================================

pub(crate) struct SetInner {
    id: SetId,
    members: RefCell<IndexMap<EffectId, Rc<EffectNode>>>,
}

/// The set of effects currently subscribed to one reactive value.
///
/// Membership is ordered by first subscription, which is the order effects
/// are notified in.
#[derive(Clone)]
pub struct SubscriberSet(Rc<SetInner>);

impl SubscriberSet {
    pub fn new() -> Self {
        Self(Rc::new(SetInner {
            id: next_id(&NEXT_SET_ID),
            members: RefCell::new(IndexMap::new()),
        }))
    }

    pub fn len(&self) -> usize {
        self.0.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn contains(&self, effect: &EffectNode) -> bool {
        self.0.members.borrow().contains_key(&effect.id)
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Record that `effect` depends on `set`. Idempotent.
pub(crate) fn subscribe(effect: &Rc<EffectNode>, set: &SubscriberSet) {
    if effect.disposed.get() {
        return;
    }
    set.0
        .members
        .borrow_mut()
        .entry(effect.id)
        .or_insert_with(|| effect.clone());
    effect
        .dependencies
        .borrow_mut()
        .entry(set.0.id)
        .or_insert_with(|| Rc::downgrade(&set.0));
}

/// Execute every effect subscribed to `set`.
///
/// Iterates a snapshot: effects that resubscribe while running are not
/// visited twice, and effects removed mid-walk still run once.
pub(crate) fn notify(set: &SubscriberSet) {
    let snapshot: Vec<Rc<EffectNode>> = set.0.members.borrow().values().cloned().collect();
    for effect in snapshot {
        effect.execute();
    }
}

/// Remove `effect` from every set it is subscribed to.
pub(crate) fn unsubscribe_all(effect: &EffectNode) {
    let dependencies = std::mem::take(&mut *effect.dependencies.borrow_mut());
    for (_, dependency) in dependencies {
        if let Some(set) = dependency.upgrade() {
            set.members.borrow_mut().shift_remove(&effect.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_node() -> Rc<EffectNode> {
        Rc::new(EffectNode::new(Rc::new(|| {})))
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let set = SubscriberSet::new();
        let node = noop_node();

        subscribe(&node, &set);
        subscribe(&node, &set);

        assert_eq!(set.len(), 1);
        assert_eq!(node.dependencies.borrow().len(), 1);
    }

    #[test]
    fn test_unsubscribe_all_clears_both_sides() {
        let first = SubscriberSet::new();
        let second = SubscriberSet::new();
        let node = noop_node();

        subscribe(&node, &first);
        subscribe(&node, &second);
        unsubscribe_all(&node);

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert!(node.dependencies.borrow().is_empty());
    }

    #[test]
    fn test_disposed_effect_never_subscribes() {
        let set = SubscriberSet::new();
        let node = noop_node();
        node.disposed.set(true);

        subscribe(&node, &set);
        assert!(set.is_empty());
    }
}
