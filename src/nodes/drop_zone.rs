//! Drop zones: the insertion targets above and below each section and field.

use super::view::{View, slots};
use crate::reactive::{create_effect, Reactive};
use crate::types::{InsertPosition, NodeId};

/// One insertion target. Hidden unless a compatible drag is in progress.
#[derive(Clone)]
pub struct DropZone {
    owner: NodeId,
    position: InsertPosition,
    visible: Reactive<bool>,
    indicator: Reactive<bool>,
}

impl DropZone {
    pub fn new(owner: NodeId, position: InsertPosition) -> Self {
        Self {
            owner,
            position,
            visible: Reactive::new(false),
            indicator: Reactive::new(false),
        }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn position(&self) -> InsertPosition {
        self.position
    }

    pub fn show(&self) {
        self.visible.set(true);
    }

    pub fn hide(&self) {
        self.visible.set(false);
        self.indicator.set(false);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Light the insertion indicator while a drag hovers this zone.
    pub fn drag_over(&self) {
        if self.visible.get_untracked() {
            self.indicator.set(true);
        }
    }

    pub fn drag_leave(&self) {
        self.indicator.set(false);
    }

    pub fn is_indicated(&self) -> bool {
        self.indicator.get()
    }
}

/// The pair of zones every section and field carries.
#[derive(Clone)]
pub struct DropZones {
    pub top: DropZone,
    pub bottom: DropZone,
}

impl DropZones {
    pub fn new(owner: NodeId) -> Self {
        Self {
            top: DropZone::new(owner, InsertPosition::BeforeBegin),
            bottom: DropZone::new(owner, InsertPosition::AfterEnd),
        }
    }

    pub fn zone(&self, position: InsertPosition) -> &DropZone {
        match position {
            InsertPosition::BeforeBegin => &self.top,
            InsertPosition::AfterEnd => &self.bottom,
        }
    }

    pub fn show(&self) {
        self.top.show();
        self.bottom.show();
    }

    pub fn hide(&self) {
        self.top.hide();
        self.bottom.hide();
    }

    pub fn any_visible(&self) -> bool {
        self.top.is_visible() || self.bottom.is_visible()
    }

    /// Bind both zones to `view`. Must run inside the owner's scope.
    pub fn paint(&self, view: &View) {
        for (zone, visible_slot, indicator_slot) in [
            (&self.top, slots::ZONE_TOP_VISIBLE, slots::ZONE_TOP_INDICATOR),
            (&self.bottom, slots::ZONE_BOTTOM_VISIBLE, slots::ZONE_BOTTOM_INDICATOR),
        ] {
            let (visible, indicator, v) = (zone.visible.clone(), zone.indicator.clone(), view.clone());
            create_effect(move || {
                v.set_flag(visible_slot, visible.get());
                v.set_flag(indicator_slot, indicator.get());
            });
        }
    }
}
