//! List fields: a grid of list items against input columns.

use serde_json::json;

use crate::error::Result;
use crate::nodes::{slots, FieldContext, FieldView};
use crate::reactive::{create_effect, Key, Value};

const COLUMNS: Key<Vec<Value>> = Key::new("columns");
const CELL_TYPES: Key<Vec<Value>> = Key::new("fields");
const LIST_ITEMS: Key<Vec<Value>> = Key::new("listItems");
const COLUMN_HEADERS: Key<bool> = Key::new("includeColumnHeaders");

fn texts(values: &[Value]) -> Vec<String> {
    values.iter().map(Value::to_string).collect()
}

pub struct ListView;

impl FieldView for ListView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "List",
            "defaultValue": null,
            "layout": "block",
            "includeColumnHeaders": true,
            "columns": ["one", "two", "three", "four", "five", "six"],
            "fields": ["text", "text", "number", "text", "number", "text"],
            "listItems": ["Option One", "Option Two", "Option Three"],
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            let columns = d.read(COLUMNS).unwrap_or_default();
            if columns.is_empty() {
                v.set_flag(slots::LIST_EMPTY, true);
                v.set_items(slots::LIST_HEADERS, Vec::new());
                v.set_items(slots::LIST_ROWS, Vec::new());
                v.set_items(slots::LIST_CELLS, Vec::new());
                return;
            }
            v.set_flag(slots::LIST_EMPTY, false);

            let headers = if d.read(COLUMN_HEADERS).unwrap_or(true) { texts(&columns) } else { Vec::new() };
            v.set_items(slots::LIST_HEADERS, headers);
            v.set_items(slots::LIST_ROWS, texts(&d.read(LIST_ITEMS).unwrap_or_default()));
            v.set_items(slots::LIST_CELLS, texts(&d.read(CELL_TYPES).unwrap_or_default()));
        });
        Ok(())
    }
}
