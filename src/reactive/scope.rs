//! Effect scopes: an owner that collects effects and cleanups so they can
//! all be stopped together.
//!
//! Every designer node runs its view code inside its own scope and stops the
//! scope when the node is destroyed.
//!
//! ```ignore
//! let scope = effect_scope();
//! scope.run(|| {
//!     create_effect(move || paint(label.get()));
//!     on_scope_dispose(|| println!("view torn down"));
//! });
//! scope.stop();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::context::{Owner, OwnerFrame, current_owner};
use super::graph::EffectNode;
use crate::types::Cleanup;

pub(crate) struct ScopeInner {
    effects: RefCell<Vec<Rc<EffectNode>>>,
    cleanups: RefCell<Vec<Cleanup>>,
    stopped: Cell<bool>,
}

impl ScopeInner {
    pub(crate) fn adopt(&self, effect: Rc<EffectNode>) {
        if self.stopped.get() {
            effect.dispose();
            return;
        }
        let mut effects = self.effects.borrow_mut();
        effects.retain(|owned| !owned.disposed.get());
        effects.push(effect);
    }
}

#[derive(Clone)]
pub struct EffectScope(Rc<ScopeInner>);

pub fn effect_scope() -> EffectScope {
    EffectScope(Rc::new(ScopeInner {
        effects: RefCell::new(Vec::new()),
        cleanups: RefCell::new(Vec::new()),
        stopped: Cell::new(false),
    }))
}

impl EffectScope {
    /// Run `f` with this scope as the owner of any effect it creates.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let _owner = OwnerFrame::enter(Owner::Scope(self.0.clone()));
        f()
    }

    /// Dispose every owned effect, then run the registered cleanups.
    pub fn stop(&self) {
        if self.0.stopped.replace(true) {
            return;
        }
        let effects = std::mem::take(&mut *self.0.effects.borrow_mut());
        for effect in effects {
            effect.dispose();
        }
        let cleanups = std::mem::take(&mut *self.0.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.0.stopped.get()
    }

    pub fn effect_count(&self) -> usize {
        self.0.effects.borrow().len()
    }
}

/// Register `f` to run when the current scope stops.
///
/// Inside an effect the hook is tied to that effect instead, like
/// [`on_cleanup`](super::on_cleanup). Outside any owner it does nothing.
pub fn on_scope_dispose(f: impl FnOnce() + 'static) {
    match current_owner() {
        Some(Owner::Scope(scope)) => {
            if scope.stopped.get() {
                f();
            } else {
                scope.cleanups.borrow_mut().push(Box::new(f));
            }
        }
        Some(Owner::Effect(effect)) => effect.cleanups.borrow_mut().push(Box::new(f)),
        None => {}
    }
}
