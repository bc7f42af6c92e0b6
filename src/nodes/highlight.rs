//! Container highlight: hover outline, active marker and the delete/copy
//! confirmation panels drawn over a section or field.

use tracing::debug;

use super::view::{View, slots};
use crate::events::bubble::{self, BubbleEvent};
use crate::events::queue_microtask;
use crate::reactive::{create_effect, Reactive};
use crate::types::NodeId;

#[derive(Clone)]
pub struct Highlight {
    owner: NodeId,
    visible: Reactive<bool>,
    active: Reactive<bool>,
    state: Reactive<Option<String>>,
    name: Reactive<String>,
    confirm_delete: Reactive<bool>,
    confirm_copy: Reactive<bool>,
}

impl Highlight {
    pub fn new(owner: NodeId) -> Self {
        Self {
            owner,
            visible: Reactive::new(false),
            active: Reactive::new(false),
            state: Reactive::new(None),
            name: Reactive::new(String::new()),
            confirm_delete: Reactive::new(false),
            confirm_copy: Reactive::new(false),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn set_state(&self, state: Option<&str>) {
        self.state.set(state.map(str::to_string));
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.name.set(name.into());
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    /// Show the outline on hover unless the node is already active.
    pub fn pointer_enter(&self) {
        if !self.active.get_untracked() {
            self.visible.set(true);
        }
    }

    pub fn pointer_leave(&self) {
        if !self.active.get_untracked() {
            self.visible.set(false);
        }
    }

    pub fn activate(&self) {
        self.active.set(true);
        self.visible.set(true);
    }

    /// Drop the active marker and hide the outline and any open panel.
    pub fn deactivate(&self) {
        if !self.active.get_untracked() && !self.visible.get_untracked() {
            return;
        }
        self.active.set(false);
        self.visible.set(false);
        self.confirm_delete.set(false);
        self.confirm_copy.set(false);
    }

    // =========================================================================
    // Confirmation panels
    // =========================================================================

    pub fn request_delete(&self) {
        self.confirm_copy.set(false);
        self.confirm_delete.set(true);
    }

    pub fn cancel_delete(&self) {
        self.confirm_delete.set(false);
    }

    /// Close the panel and dispatch `delete` at the owner once the current
    /// event has finished.
    pub fn confirm_delete(&self) {
        self.confirm_delete.set(false);
        let origin = self.owner;
        debug!(node = %origin, "delete confirmed");
        queue_microtask(move || {
            bubble::dispatch(origin, BubbleEvent::Delete { origin });
        });
    }

    pub fn request_copy(&self) {
        self.confirm_delete.set(false);
        self.confirm_copy.set(true);
    }

    pub fn cancel_copy(&self) {
        self.confirm_copy.set(false);
    }

    pub fn confirm_copy(&self) {
        self.confirm_copy.set(false);
        let origin = self.owner;
        debug!(node = %origin, "copy confirmed");
        queue_microtask(move || {
            bubble::dispatch(origin, BubbleEvent::Copy { origin });
        });
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirm_delete.get()
    }

    pub fn is_confirming_copy(&self) -> bool {
        self.confirm_copy.get()
    }

    /// Bind the highlight to `view`. Must run inside the owner's scope.
    pub fn paint(&self, view: &View) {
        let (visible, active, v) = (self.visible.clone(), self.active.clone(), view.clone());
        create_effect(move || {
            v.set_flag(slots::HIGHLIGHT_VISIBLE, visible.get());
            v.set_flag(slots::HIGHLIGHT_ACTIVE, active.get());
        });

        let (state, v) = (self.state.clone(), view.clone());
        create_effect(move || match state.get() {
            Some(text) => v.set_text(slots::HIGHLIGHT_STATE, text),
            None => v.clear_text(slots::HIGHLIGHT_STATE),
        });

        let (name, v) = (self.name.clone(), view.clone());
        create_effect(move || v.set_text(slots::HIGHLIGHT_NAME, name.get()));

        let (delete, copy, v) = (self.confirm_delete.clone(), self.confirm_copy.clone(), view.clone());
        create_effect(move || {
            v.set_flag(slots::CONFIRM_DELETE, delete.get());
            v.set_flag(slots::CONFIRM_COPY, copy.get());
        });
    }
}
