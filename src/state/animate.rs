//! Transition Animations - host-clocked enter and exit transitions.
//!
//! Nodes fade in when first connected and fade out before removal. The
//! host drives time by calling [`advance_animations`]; a removal only
//! happens once its exit transition has finished.
//!
//! # Example
//!
//! ```ignore
//! use form_designer::state::animate::{animate_exit, advance_animations};
//!
//! animate_exit(node, 150, move || detach(node));
//! advance_animations(100); // still animating
//! advance_animations(50);  // callback runs, node detached
//! ```

use std::cell::RefCell;

use tracing::trace;

use crate::reactive::Reactive;
use crate::types::NodeId;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationKind {
    Enter,
    Exit,
}

struct Animation {
    node: NodeId,
    kind: AnimationKind,
    remaining_ms: u64,
    on_finish: Option<Box<dyn FnOnce()>>,
}

thread_local! {
    static ANIMATIONS: RefCell<Vec<Animation>> = const { RefCell::new(Vec::new()) };

    /// Number of running animations, for views that dim while busy.
    static ACTIVE: Reactive<usize> = Reactive::new(0);
}

fn publish_count() {
    let count = ANIMATIONS.with(|animations| animations.borrow().len());
    ACTIVE.with(|active| {
        if active.get_untracked() != count {
            active.set(count);
        }
    });
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Start an enter transition for `node`.
pub fn animate_enter(node: NodeId, duration_ms: u64) {
    start(node, AnimationKind::Enter, duration_ms, None);
}

/// Start an exit transition; `on_finish` runs when it completes.
///
/// A node already exiting keeps its first exit; the new callback is dropped.
/// Returns whether a new exit was started.
pub fn animate_exit(node: NodeId, duration_ms: u64, on_finish: impl FnOnce() + 'static) -> bool {
    if animation_kind(node) == Some(AnimationKind::Exit) {
        trace!(%node, "exit already in progress");
        return false;
    }
    cancel_animations(node);
    start(node, AnimationKind::Exit, duration_ms, Some(Box::new(on_finish)));
    true
}

fn start(node: NodeId, kind: AnimationKind, duration_ms: u64, on_finish: Option<Box<dyn FnOnce()>>) {
    ANIMATIONS.with(|animations| {
        animations.borrow_mut().push(Animation {
            node,
            kind,
            remaining_ms: duration_ms,
            on_finish,
        });
    });
    trace!(%node, ?kind, duration_ms, "animation started");
    publish_count();
}

/// Advance every animation by `elapsed_ms`.
///
/// Finished animations are removed and their callbacks run in start order,
/// after the animation list has been released. Zero-length animations finish
/// on the first advance. Returns how many finished.
pub fn advance_animations(elapsed_ms: u64) -> usize {
    let finished: Vec<Animation> = ANIMATIONS.with(|animations| {
        let mut animations = animations.borrow_mut();
        let mut finished = Vec::new();
        let mut index = 0;
        while index < animations.len() {
            let animation = &mut animations[index];
            animation.remaining_ms = animation.remaining_ms.saturating_sub(elapsed_ms);
            if animation.remaining_ms == 0 {
                finished.push(animations.remove(index));
            } else {
                index += 1;
            }
        }
        finished
    });

    let count = finished.len();
    if count > 0 {
        publish_count();
    }
    for animation in finished {
        trace!(node = %animation.node, kind = ?animation.kind, "animation finished");
        if let Some(on_finish) = animation.on_finish {
            on_finish();
        }
    }
    count
}

/// Complete every running animation, including ones started by callbacks.
pub fn finish_animations() -> usize {
    let mut total = 0;
    loop {
        let finished = advance_animations(u64::MAX);
        if finished == 0 {
            return total;
        }
        total += finished;
    }
}

pub fn is_animating(node: NodeId) -> bool {
    animation_kind(node).is_some()
}

pub fn animation_kind(node: NodeId) -> Option<AnimationKind> {
    ANIMATIONS.with(|animations| {
        animations
            .borrow()
            .iter()
            .rev()
            .find(|animation| animation.node == node)
            .map(|animation| animation.kind)
    })
}

/// Drop `node`'s animations without running their callbacks.
pub fn cancel_animations(node: NodeId) {
    ANIMATIONS.with(|animations| animations.borrow_mut().retain(|animation| animation.node != node));
    publish_count();
}

/// Running animation count. Tracked.
pub fn active_animations() -> usize {
    ACTIVE.with(Reactive::get)
}

pub fn reset_animations() {
    ANIMATIONS.with(|animations| animations.borrow_mut().clear());
    publish_count();
}
