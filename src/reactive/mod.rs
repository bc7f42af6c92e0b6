//! Reactive Core - fine-grained dependency tracking.
//!
//! - [`Reactive`] - a single tracked value
//! - [`ReactiveObject`] - a record whose every field is tracked separately
//! - [`create_effect`] - rerun a closure when what it read changes
//! - [`create_memo`] - a derived, cached value
//! - [`EffectScope`] - group effects so they can be stopped together
//! - [`untrack`] - read without subscribing
//!
//! # Pattern
//!
//! Reads are attributed to the innermost executing effect. Writes run every
//! subscribed effect synchronously, before the write returns. There is no
//! batching and no equality check on writes.
//!
//! All state is thread-local; reactive values are `!Send`.

mod cell;
mod context;
mod effect;
mod graph;
mod object;
mod scope;
mod value;

pub use cell::Reactive;
pub use context::{context_depth, is_tracking, untrack};
pub use effect::{create_effect, create_memo, on_cleanup, Effect, Memo};
pub use graph::SubscriberSet;
pub use object::{keys, Key, ReactiveObject};
pub use scope::{effect_scope, on_scope_dispose, EffectScope};
pub use value::{FromValue, Value};
