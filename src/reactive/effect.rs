//! Effects and memos.
//!
//! An effect is a closure that runs once on creation and again every time a
//! reactive value it read during its previous run is written. Before each
//! run the effect drops all of its old subscriptions, so its dependency set
//! is always exactly what the latest run read.
//!
//! # Example
//!
//! ```ignore
//! use form_designer::reactive::{create_effect, Reactive};
//!
//! let label = Reactive::new(String::from("Name"));
//! let l = label.clone();
//! let effect = create_effect(move || println!("label is {}", l.get()));
//!
//! label.set("Full name".into()); // prints again
//! effect.dispose();
//! label.set("Ignored".into());   // prints nothing
//! ```

use std::cell::{Cell, OnceCell};
use std::rc::Rc;

use tracing::{trace, warn};

use super::cell::Reactive;
use super::context::{ContextFrame, Owner, OwnerFrame, current_owner};
use super::graph::{EffectNode, unsubscribe_all};

// =============================================================================
// Effect
// =============================================================================

/// Handle to a live effect.
///
/// Dropping the handle does not stop the effect. Call [`Effect::dispose`] or
/// stop the scope that owns it.
#[derive(Clone)]
pub struct Effect(pub(crate) Rc<EffectNode>);

/// Create an effect and run it immediately.
///
/// The effect is adopted by the current owner: the enclosing effect (which
/// disposes it before its own next run) or the enclosing
/// [`EffectScope`](super::EffectScope).
pub fn create_effect(f: impl Fn() + 'static) -> Effect {
    let node = Rc::new(EffectNode::new(Rc::new(f)));
    if let Some(owner) = current_owner() {
        owner.adopt(node.clone());
    }
    node.execute();
    Effect(node)
}

/// Register `f` to run before the current effect's next execution, or when
/// it is disposed. Outside an effect this does nothing.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    if let Some(Owner::Effect(effect)) = current_owner() {
        effect.cleanups.borrow_mut().push(Box::new(f));
    }
}

impl Effect {
    /// Run the effect now, re-collecting its dependencies.
    pub fn execute(&self) {
        self.0.execute();
    }

    /// Stop the effect permanently. Idempotent.
    pub fn dispose(&self) {
        self.0.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    /// Number of reactive values read by the latest run.
    pub fn dependency_count(&self) -> usize {
        self.0.dependencies.borrow().len()
    }

    /// Number of effects created by the latest run that are still alive.
    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.0.id)
            .field("dependencies", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Consecutive runs of one effect triggered by its own notifications.
const MAX_RERUNS: usize = 100;

struct RunningGuard<'a>(&'a Cell<bool>);

impl<'a> RunningGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        RunningGuard(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EffectNode {
    pub(crate) fn execute(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        // Notified while its body is still on the stack: finish the current
        // run, then run again from the top.
        if self.running.get() {
            trace!(effect = self.id, "re-entrant notification, rerun scheduled");
            self.dirty.set(true);
            return;
        }

        let _running = RunningGuard::enter(&self.running);
        let mut runs = 0;
        loop {
            self.dirty.set(false);
            self.teardown();

            let Some(f) = self.f.borrow().clone() else {
                return;
            };
            {
                let _context = ContextFrame::enter(self.clone());
                let _owner = OwnerFrame::enter(Owner::Effect(self.clone()));
                f();
            }
            runs += 1;

            if !self.dirty.get() || self.disposed.get() {
                return;
            }
            if runs >= MAX_RERUNS {
                warn!(effect = self.id, runs, "effect keeps invalidating itself; giving up");
                self.dirty.set(false);
                return;
            }
        }
    }

    pub(crate) fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.teardown();
        self.f.borrow_mut().take();
    }

    /// Drop subscriptions, children and cleanup hooks from the previous run.
    fn teardown(&self) {
        unsubscribe_all(self);

        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.dispose();
        }

        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }
    }
}

// =============================================================================
// Memo
// =============================================================================

/// A derived value: an effect that writes its result into its own
/// [`Reactive`]. Readers of the memo depend on that value, not on the
/// memo's sources.
pub struct Memo<T> {
    value: Reactive<T>,
    effect: Effect,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            effect: self.effect.clone(),
        }
    }
}

/// Create a memo whose value is recomputed whenever `f`'s dependencies change.
pub fn create_memo<T: 'static>(f: impl Fn() -> T + 'static) -> Memo<T> {
    let slot: Rc<OnceCell<Reactive<T>>> = Rc::new(OnceCell::new());
    let writer = slot.clone();

    let effect = create_effect(move || {
        let next = f();
        match writer.get() {
            Some(value) => value.set(next),
            None => {
                let _ = writer.set(Reactive::new(next));
            }
        }
    });

    let Some(value) = slot.get().cloned() else {
        unreachable!("memo effect runs synchronously on creation");
    };
    Memo { value, effect }
}

impl<T: 'static> Memo<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// The underlying effect, for disposal.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }
}

impl<T: Clone + 'static> Memo<T> {
    pub fn get(&self) -> T {
        self.value.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_effect_runs_on_creation_and_on_write() {
        let count = Reactive::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let c = count.clone();
        let l = log.clone();
        let _effect = create_effect(move || l.borrow_mut().push(c.get()));

        count.set(1);
        count.set(1);
        count.set(1);

        assert_eq!(*log.borrow(), vec![0, 1, 1, 1]);
    }

    #[test]
    fn test_dependencies_follow_latest_run() {
        let flag = Reactive::new(true);
        let a = Reactive::new("a");
        let b = Reactive::new("b");
        let runs = Rc::new(Cell::new(0));

        let (f, a2, b2, r) = (flag.clone(), a.clone(), b.clone(), runs.clone());
        let effect = create_effect(move || {
            r.set(r.get() + 1);
            if f.get() {
                a2.get();
            } else {
                b2.get();
            }
        });

        assert_eq!(effect.dependency_count(), 2);
        flag.set(false);
        assert_eq!(runs.get(), 2);
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 1);

        a.set("a2");
        assert_eq!(runs.get(), 2);
        b.set("b2");
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_dispose_stops_reruns_and_unsubscribes() {
        let count = Reactive::new(0);
        let runs = Rc::new(Cell::new(0));

        let (c, r) = (count.clone(), runs.clone());
        let effect = create_effect(move || {
            c.get();
            r.set(r.get() + 1);
        });

        effect.dispose();
        effect.dispose();
        count.set(5);

        assert_eq!(runs.get(), 1);
        assert_eq!(count.subscriber_count(), 0);
        assert!(effect.is_disposed());
    }

    #[test]
    fn test_self_write_reruns_until_stable() {
        let count = Reactive::new(0);
        let runs = Rc::new(Cell::new(0));

        let (c, r) = (count.clone(), runs.clone());
        let _effect = create_effect(move || {
            r.set(r.get() + 1);
            let value = c.get();
            if value < 10 {
                c.set(value + 1);
            }
        });

        assert_eq!(count.get_untracked(), 10);
        assert_eq!(runs.get(), 11);
        assert_eq!(count.subscriber_count(), 1);
    }

    #[test]
    fn test_unbounded_self_write_is_capped() {
        let count = Reactive::new(0);
        let runs = Rc::new(Cell::new(0));

        let (c, r) = (count.clone(), runs.clone());
        let effect = create_effect(move || {
            r.set(r.get() + 1);
            c.set(c.get() + 1);
        });

        assert_eq!(runs.get(), MAX_RERUNS);
        assert!(!effect.is_disposed());

        count.set(0);
        assert_eq!(runs.get(), 2 * MAX_RERUNS);
    }

    #[test]
    fn test_downstream_write_reruns_the_reader() {
        let trigger = Reactive::new(0);
        let v = Reactive::new(0);
        let w = Reactive::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (v2, w2) = (v.clone(), w.clone());
        let _downstream = create_effect(move || {
            let next = v2.get() * 10;
            if w2.get_untracked() != next {
                w2.set(next);
            }
        });

        let (t, v3, w3, s) = (trigger.clone(), v.clone(), w.clone(), seen.clone());
        let _upstream = create_effect(move || {
            s.borrow_mut().push(w3.get());
            v3.set(t.get());
        });

        trigger.set(5);
        assert_eq!(w.get_untracked(), 50);
        assert_eq!(seen.borrow().last().copied(), Some(50));
        assert_eq!(w.subscriber_count(), 1);

        trigger.set(2);
        assert_eq!(w.get_untracked(), 20);
        assert_eq!(seen.borrow().last().copied(), Some(20));
    }

    #[test]
    fn test_dispose_during_run_stops_rerun() {
        let count = Reactive::new(0);
        let runs = Rc::new(Cell::new(0));
        let handle: Rc<RefCell<Option<Effect>>> = Rc::new(RefCell::new(None));

        let (c, r, h) = (count.clone(), runs.clone(), handle.clone());
        let effect = create_effect(move || {
            r.set(r.get() + 1);
            c.get();
            if let Some(effect) = h.borrow().as_ref() {
                c.set(1);
                effect.dispose();
            }
        });
        *handle.borrow_mut() = Some(effect.clone());

        count.set(5);
        assert!(effect.is_disposed());
        assert_eq!(runs.get(), 2);
        assert_eq!(count.subscriber_count(), 0);
    }

    #[test]
    fn test_child_effects_disposed_on_parent_rerun() {
        let outer = Reactive::new(0);
        let inner = Reactive::new(0);
        let inner_runs = Rc::new(Cell::new(0));

        let (o, i, r) = (outer.clone(), inner.clone(), inner_runs.clone());
        let parent = create_effect(move || {
            o.get();
            let i = i.clone();
            let r = r.clone();
            create_effect(move || {
                i.get();
                r.set(r.get() + 1);
            });
        });

        assert_eq!(parent.child_count(), 1);
        outer.set(1);
        assert_eq!(parent.child_count(), 1);
        assert_eq!(inner.subscriber_count(), 1);

        inner_runs.set(0);
        inner.set(1);
        assert_eq!(inner_runs.get(), 1);
    }

    #[test]
    fn test_on_cleanup_runs_before_rerun_and_on_dispose() {
        let count = Reactive::new(0);
        let cleanups = Rc::new(Cell::new(0));

        let (c, k) = (count.clone(), cleanups.clone());
        let effect = create_effect(move || {
            c.get();
            let k = k.clone();
            on_cleanup(move || k.set(k.get() + 1));
        });

        count.set(1);
        assert_eq!(cleanups.get(), 1);
        effect.dispose();
        assert_eq!(cleanups.get(), 2);
    }

    #[test]
    fn test_memo_recomputes_from_sources() {
        let width = Reactive::new(2);
        let height = Reactive::new(3);

        let (w, h) = (width.clone(), height.clone());
        let area = create_memo(move || w.get() * h.get());
        assert_eq!(area.get(), 6);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a, s) = (area.clone(), seen.clone());
        let _reader = create_effect(move || s.borrow_mut().push(a.get()));

        width.set(4);
        assert_eq!(area.get(), 12);
        assert_eq!(*seen.borrow(), vec![6, 12]);
    }
}
