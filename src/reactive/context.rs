//! Execution context: which effect is observing reads, and who owns new effects.
//!
//! Both stacks are pushed by guards whose `Drop` pops them, so an effect
//! body that panics still leaves the stacks balanced.

use std::cell::RefCell;
use std::rc::Rc;

use super::graph::{EffectNode, SubscriberSet, subscribe};
use super::scope::ScopeInner;

thread_local! {
    /// Effects currently executing, innermost last.
    static CONTEXT: RefCell<Vec<Rc<EffectNode>>> = const { RefCell::new(Vec::new()) };

    /// Owners that adopt newly created effects, innermost last.
    static OWNERS: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Observer stack
// =============================================================================

/// The effect that reads are currently attributed to.
pub(crate) fn current_observer() -> Option<Rc<EffectNode>> {
    CONTEXT.with(|stack| stack.borrow().last().cloned())
}

/// Subscribe the current observer, if any, to `set`.
pub(crate) fn track(set: &SubscriberSet) {
    if let Some(observer) = current_observer() {
        subscribe(&observer, set);
    }
}

/// Whether a read right now would create a dependency.
pub fn is_tracking() -> bool {
    CONTEXT.with(|stack| !stack.borrow().is_empty())
}

/// Number of effects currently executing on this thread.
pub fn context_depth() -> usize {
    CONTEXT.with(|stack| stack.borrow().len())
}

pub(crate) struct ContextFrame(());

impl ContextFrame {
    pub(crate) fn enter(effect: Rc<EffectNode>) -> Self {
        CONTEXT.with(|stack| stack.borrow_mut().push(effect));
        ContextFrame(())
    }
}

impl Drop for ContextFrame {
    fn drop(&mut self) {
        CONTEXT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` with dependency tracking suspended.
///
/// Reads inside `f` subscribe nothing. Writes still notify. The observer
/// stack is restored afterwards even if `f` panics.
///
/// ```ignore
/// create_effect(move || {
///     let year = year.get();                    // tracked
///     let start = untrack(|| window.get());     // not tracked
///     paint_years(start, year);
/// });
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    struct Restore(Option<Vec<Rc<EffectNode>>>);

    impl Drop for Restore {
        fn drop(&mut self) {
            if let Some(previous) = self.0.take() {
                CONTEXT.with(|stack| *stack.borrow_mut() = previous);
            }
        }
    }

    let previous = CONTEXT.with(|stack| std::mem::take(&mut *stack.borrow_mut()));
    let _restore = Restore(Some(previous));
    f()
}

// =============================================================================
// Owner stack
// =============================================================================

#[derive(Clone)]
pub(crate) enum Owner {
    Effect(Rc<EffectNode>),
    Scope(Rc<ScopeInner>),
}

impl Owner {
    pub(crate) fn adopt(&self, effect: Rc<EffectNode>) {
        match self {
            Owner::Effect(parent) => parent.children.borrow_mut().push(effect),
            Owner::Scope(scope) => scope.adopt(effect),
        }
    }
}

pub(crate) fn current_owner() -> Option<Owner> {
    OWNERS.with(|stack| stack.borrow().last().cloned())
}

pub(crate) struct OwnerFrame(());

impl OwnerFrame {
    pub(crate) fn enter(owner: Owner) -> Self {
        OWNERS.with(|stack| stack.borrow_mut().push(owner));
        OwnerFrame(())
    }
}

impl Drop for OwnerFrame {
    fn drop(&mut self) {
        OWNERS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
