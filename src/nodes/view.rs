//! Headless view state.
//!
//! Effects paint into a [`View`]: named text slots, boolean flags and item
//! lists. The host renders whatever the view holds; tests read it back.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Well-known slot names.
pub mod slots {
    pub const LABEL: &str = "label";
    pub const LABEL_VISIBLE: &str = "label.visible";
    pub const REQUIRED_MARK: &str = "label.required";
    pub const DESCRIPTION: &str = "description";
    pub const DESCRIPTION_VISIBLE: &str = "description.visible";
    pub const INLINE: &str = "layout.inline";
    pub const DIMMED: &str = "dimmed";

    pub const INPUT_VALUE: &str = "input.value";
    pub const INPUT_PLACEHOLDER: &str = "input.placeholder";
    pub const INPUT_READONLY: &str = "input.readonly";
    pub const INPUT_DISABLED: &str = "input.disabled";
    pub const INPUT_RANGE: &str = "input.range";
    pub const INPUT_FORMAT: &str = "input.format";
    pub const INPUT_BUTTON_VISIBLE: &str = "input.button.visible";

    pub const HIGHLIGHT_VISIBLE: &str = "highlight.visible";
    pub const HIGHLIGHT_ACTIVE: &str = "highlight.active";
    pub const HIGHLIGHT_STATE: &str = "highlight.state";
    pub const HIGHLIGHT_NAME: &str = "highlight.name";
    pub const CONFIRM_DELETE: &str = "highlight.confirm.delete";
    pub const CONFIRM_COPY: &str = "highlight.confirm.copy";

    pub const ZONE_TOP_VISIBLE: &str = "zone.top.visible";
    pub const ZONE_TOP_INDICATOR: &str = "zone.top.indicator";
    pub const ZONE_BOTTOM_VISIBLE: &str = "zone.bottom.visible";
    pub const ZONE_BOTTOM_INDICATOR: &str = "zone.bottom.indicator";

    pub const CONTENT: &str = "content";
    pub const HEADING_LEVEL: &str = "heading.level";

    pub const SELECT_PROMPT: &str = "select.prompt";
    pub const SELECT_DROPDOWN: &str = "select.dropdown";
    pub const OPTIONS: &str = "options";
    pub const OPTIONS_EMPTY: &str = "options.empty";
    pub const OPTIONS_INPUT: &str = "options.input";

    pub const LIST_EMPTY: &str = "list.empty";
    pub const LIST_HEADERS: &str = "list.headers";
    pub const LIST_ROWS: &str = "list.rows";
    pub const LIST_CELLS: &str = "list.cells";

    pub const CALCULATION_FIELDS: &str = "calculation.fields";

    pub const EMPTY_PLACEHOLDER: &str = "section.empty";
    pub const EXITING: &str = "transition.exiting";
}

#[derive(Debug, Default)]
struct ViewState {
    text: BTreeMap<String, String>,
    flags: BTreeMap<String, bool>,
    items: BTreeMap<String, Vec<String>>,
}

/// Shared, mutable render state of one node or widget.
#[derive(Clone, Debug, Default)]
pub struct View(Rc<RefCell<ViewState>>);

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&self, slot: &str, text: impl Into<String>) {
        self.0.borrow_mut().text.insert(slot.to_string(), text.into());
    }

    pub fn text(&self, slot: &str) -> Option<String> {
        self.0.borrow().text.get(slot).cloned()
    }

    /// Text of a slot, empty when unset.
    pub fn text_or_empty(&self, slot: &str) -> String {
        self.text(slot).unwrap_or_default()
    }

    pub fn clear_text(&self, slot: &str) {
        self.0.borrow_mut().text.remove(slot);
    }

    pub fn set_flag(&self, slot: &str, on: bool) {
        self.0.borrow_mut().flags.insert(slot.to_string(), on);
    }

    /// Unset flags read as `false`.
    pub fn flag(&self, slot: &str) -> bool {
        self.0.borrow().flags.get(slot).copied().unwrap_or(false)
    }

    pub fn set_items(&self, slot: &str, items: Vec<String>) {
        self.0.borrow_mut().items.insert(slot.to_string(), items);
    }

    pub fn items(&self, slot: &str) -> Vec<String> {
        self.0.borrow().items.get(slot).cloned().unwrap_or_default()
    }
}
