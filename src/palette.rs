//! Palette - the list of field types a user can drag onto the canvas.

use serde::Serialize;

use crate::error::Result;
use crate::nodes::registry::{registered_tags, type_defaults};
use crate::state::drag::{begin_drag, DragPayload};

/// One draggable palette item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub tag: String,
    pub label: String,
}

/// Every registered field type, in registration order. The label is the
/// type's default field label, or the tag when it has none.
pub fn palette_entries() -> Vec<PaletteEntry> {
    registered_tags()
        .into_iter()
        .map(|tag| {
            let label = type_defaults(&tag)
                .as_ref()
                .and_then(|defaults| defaults.get("label"))
                .and_then(serde_json::Value::as_str)
                .filter(|label| !label.is_empty())
                .map_or_else(|| tag.clone(), str::to_string);
            PaletteEntry { tag, label }
        })
        .collect()
}

/// Start dragging a new field of type `tag`.
pub fn start_palette_drag(tag: &str) -> Result<()> {
    begin_drag(DragPayload::Palette(tag.to_string()))
}
