//! Calculation fields: a read-only result computed from other fields.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::nodes::{slots, FieldContext, FieldNode, FieldView};
use crate::reactive::{create_effect, Key, Value};

const CALCULATION: Key<String> = Key::new("calculation");
const FIELDS: Key<Vec<Value>> = Key::new("fields");

pub struct CalculationView;

impl FieldView for CalculationView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "Calculation",
            "calculationType": null,
            "calculation": "",
            "fields": [],
            "disabled": true,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        cx.view.set_flag(slots::INPUT_DISABLED, true);

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || v.set_text(slots::INPUT_VALUE, d.read(CALCULATION).unwrap_or_default()));

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            let fields = d.read(FIELDS).unwrap_or_default();
            v.set_items(slots::CALCULATION_FIELDS, fields.iter().map(Value::to_string).collect());
        });
        Ok(())
    }

    fn commit_input(&mut self, cx: &FieldContext<'_>, _input: &str) {
        let calculation = cx.data.read_untracked(CALCULATION).unwrap_or_default();
        cx.view.set_text(slots::INPUT_VALUE, calculation);
    }
}

/// Add the field with element id `id` to `field`'s operands.
pub fn add_calculation_field(field: &FieldNode, id: &str) -> Result<()> {
    let mut fields = field.data().read_untracked(FIELDS)?;
    fields.push(Value::from(id));
    field.data().write(FIELDS, fields);
    debug!(field = %field.node_id(), operand = id, "calculation operand added");
    Ok(())
}
