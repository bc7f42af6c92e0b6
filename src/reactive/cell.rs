//! `Reactive<T>`: a shared mutable value that tracks its readers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::context::track;
use super::effect::Effect;
use super::graph::{SubscriberSet, notify};

struct ReactiveInner<T> {
    value: RefCell<T>,
    subscribers: SubscriberSet,
}

/// A reactive value.
///
/// Reading inside an effect subscribes the effect. Every write notifies all
/// subscribers synchronously, even when the new value equals the old one.
///
/// Clones share the same value and subscriber set.
pub struct Reactive<T>(Rc<ReactiveInner<T>>);

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: 'static> Reactive<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(ReactiveInner {
            value: RefCell::new(value),
            subscribers: SubscriberSet::new(),
        }))
    }

    /// Borrow the value, tracking the read.
    ///
    /// `f` must not write to this same value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track(&self.0.subscribers);
        f(&self.0.value.borrow())
    }

    /// Borrow the value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    pub fn set(&self, value: T) {
        let previous = self.0.value.replace(value);
        drop(previous);
        notify(&self.0.subscribers);
    }

    /// Mutate in place, then notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = self.0.value.borrow_mut();
            f(&mut value);
        }
        notify(&self.0.subscribers);
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.len()
    }

    pub fn has_subscriber(&self, effect: &Effect) -> bool {
        self.0.subscribers.contains(&effect.0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone + 'static> Reactive<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: Default + 'static> Default for Reactive<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => f.debug_tuple("Reactive").field(&*value).finish(),
            Err(_) => f.write_str("Reactive(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::create_effect;
    use std::cell::Cell;

    #[test]
    fn test_get_outside_effect_does_not_subscribe() {
        let value = Reactive::new(3);
        assert_eq!(value.get(), 3);
        assert_eq!(value.subscriber_count(), 0);
    }

    #[test]
    fn test_equal_write_still_notifies() {
        let value = Reactive::new(String::from("same"));
        let runs = Rc::new(Cell::new(0));

        let (v, r) = (value.clone(), runs.clone());
        let effect = create_effect(move || {
            v.with(|s| s.len());
            r.set(r.get() + 1);
        });

        value.set("same".into());
        assert_eq!(runs.get(), 2);
        assert!(value.has_subscriber(&effect));
    }

    #[test]
    fn test_update_notifies_after_release() {
        let list = Reactive::new(vec![1, 2]);
        let seen = Rc::new(Cell::new(0));

        let (l, s) = (list.clone(), seen.clone());
        let _effect = create_effect(move || s.set(l.with(Vec::len)));

        list.update(|items| items.push(3));
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_every_subscriber_runs_before_write_returns() {
        let source = Reactive::new(0);
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let (s1, f) = (source.clone(), first.clone());
        let _a = create_effect(move || f.set(s1.get()));
        let (s2, g) = (source.clone(), second.clone());
        let _b = create_effect(move || g.set(s2.get() * 10));

        source.set(4);
        assert_eq!((first.get(), second.get()), (4, 40));
    }
}
