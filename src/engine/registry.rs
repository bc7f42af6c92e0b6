//! Node Registry - Index allocation for designer nodes.
//!
//! Manages the lifecycle of node indices:
//! - ID ↔ Index bidirectional mapping
//! - Free index pool for O(1) reuse
//! - Form-scoped element id generation (`TF-00001`)
//! - Destroy callbacks, run children-first on release

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use super::tree;
use crate::error::{FormError, Result};
use crate::types::NodeId;

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map element ID to node index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Map node index to element ID.
    static INDEX_TO_ID: RefCell<HashMap<usize, String>> = RefCell::new(HashMap::new());

    /// Currently allocated indices, ordered.
    static ALLOCATED_INDICES: RefCell<BTreeSet<usize>> = const { RefCell::new(BTreeSet::new()) };

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: Cell<usize> = const { Cell::new(0) };

    /// Counter for anonymous node IDs.
    static ID_COUNTER: Cell<usize> = const { Cell::new(0) };

    /// Counter for form element IDs. Starts at 1.
    static ELEMENT_COUNTER: Cell<usize> = const { Cell::new(1) };

    /// Destroy callbacks registered per index.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Element IDs
// =============================================================================

/// Generate the next unused form element id: `{prefix}-{n}` with `n`
/// zero-padded to `width` digits.
pub fn generate_id(prefix: &str, width: usize) -> String {
    loop {
        let n = ELEMENT_COUNTER.with(|counter| {
            let n = counter.get();
            counter.set(n + 1);
            n
        });
        let id = format!("{prefix}-{n:0width$}");
        if get_index(&id).is_none() {
            return id;
        }
    }
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new node.
///
/// Anonymous nodes get a generated `c{n}` id. A named id that is already
/// allocated is rejected.
pub fn allocate_index(id: Option<&str>) -> Result<NodeId> {
    let node_id = match id {
        Some(id) => id.to_string(),
        None => ID_COUNTER.with(|counter| {
            let n = counter.get();
            counter.set(n + 1);
            format!("c{n}")
        }),
    };

    if get_index(&node_id).is_some() {
        return Err(FormError::DuplicateId(node_id));
    }

    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| free.borrow_mut().pop()).unwrap_or_else(|| {
        NEXT_INDEX.with(|next| {
            let index = next.get();
            next.set(index + 1);
            index
        })
    });

    ID_TO_INDEX.with(|map| {
        map.borrow_mut().insert(node_id.clone(), index);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().insert(index, node_id);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    trace!(index, "allocated node index");
    Ok(NodeId(index))
}

/// Release a node back to the pool.
///
/// Also recursively releases every child in the document tree, children
/// first, running each node's destroy callbacks before its mappings go.
pub fn release_index(node: NodeId) {
    let index = node.0;
    let Some(id) = get_id(node) else { return };

    for child in tree::children_of(node) {
        release_index(child);
    }

    run_destroy_callbacks(index);
    tree::remove_node(node);

    ID_TO_INDEX.with(|map| {
        map.borrow_mut().remove(&id);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().remove(&index);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });

    trace!(index, %id, "released node index");
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when `node` is released.
pub fn on_destroy(node: NodeId, callback: impl FnOnce() + 'static) {
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(node.0)
            .or_default()
            .push(Box::new(callback));
    });
}

fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Get the node for an element ID.
pub fn get_index(id: &str) -> Option<NodeId> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied().map(NodeId))
}

/// Get the element ID of a node.
pub fn get_id(node: NodeId) -> Option<String> {
    INDEX_TO_ID.with(|map| map.borrow().get(&node.0).cloned())
}

pub fn get_allocated_indices() -> Vec<NodeId> {
    ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().map(NodeId).collect())
}

pub fn is_allocated(node: NodeId) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&node.0))
}

pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry and tree state.
pub fn reset_registry() {
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    INDEX_TO_ID.with(|map| map.borrow_mut().clear());
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| next.set(0));
    ID_COUNTER.with(|counter| counter.set(0));
    ELEMENT_COUNTER.with(|counter| counter.set(1));
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    tree::reset_tree();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use std::rc::Rc;

    #[test]
    fn test_allocate_index() {
        reset_registry();

        let a = allocate_index(None).unwrap();
        let b = allocate_index(None).unwrap();
        let c = allocate_index(Some("TF-00001")).unwrap();

        assert_eq!((a.0, b.0, c.0), (0, 1, 2));
        assert!(is_allocated(c));
        assert_eq!(get_allocated_count(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        reset_registry();

        allocate_index(Some("TF-00001")).unwrap();
        assert_eq!(
            allocate_index(Some("TF-00001")),
            Err(FormError::DuplicateId("TF-00001".into()))
        );
    }

    #[test]
    fn test_release_and_reuse() {
        reset_registry();

        let a = allocate_index(None).unwrap();
        let b = allocate_index(None).unwrap();

        release_index(a);
        assert!(!is_allocated(a));
        assert!(is_allocated(b));

        let c = allocate_index(None).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_generated_ids_are_padded_and_skip_taken() {
        reset_registry();

        assert_eq!(generate_id("TF", 5), "TF-00001");
        allocate_index(Some("TF-00002")).unwrap();
        assert_eq!(generate_id("TF", 5), "TF-00003");
        assert_eq!(generate_id("IF", 3), "IF-004");
    }

    #[test]
    fn test_release_runs_children_first() {
        reset_registry();

        let order = Rc::new(RefCell::new(Vec::new()));
        let parent = allocate_index(None).unwrap();
        let child = allocate_index(None).unwrap();
        tree::insert_node(parent, NodeKind::Section);
        tree::insert_node(child, NodeKind::Field);
        tree::link(child, parent, 0).unwrap();

        let o = order.clone();
        on_destroy(parent, move || o.borrow_mut().push("parent"));
        let o = order.clone();
        on_destroy(child, move || o.borrow_mut().push("child"));

        release_index(parent);
        assert_eq!(*order.borrow(), vec!["child", "parent"]);
        assert!(!is_allocated(child));
        assert_eq!(tree::kind_of(child), None);
    }
}
