//! Select fields: a dropdown or a panel of radio/checkbox options.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::nodes::{slots, FieldContext, FieldNode, FieldView};
use crate::reactive::{create_effect, keys, Key, ReactiveObject, Value};

const PROMPT: Key<String> = Key::new("prompt");
const MULTISELECT: Key<bool> = Key::new("multiselect");
const DROPDOWN: Key<bool> = Key::new("dropdown");
const OPTION_VALUE: Key<String> = Key::new("value");

/// One selectable option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    fn from_record(record: &ReactiveObject) -> Option<Self> {
        Some(Self {
            value: record.read_untracked(OPTION_VALUE).ok()?,
            label: record.read_untracked(keys::LABEL).ok()?,
        })
    }
}

/// Slot holding one part of the option at `index`, e.g. `option.0.label`.
pub fn option_slot(index: usize, part: &str) -> String {
    format!("option.{index}.{part}")
}

pub struct SelectView;

impl FieldView for SelectView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "Select Input",
            "prompt": "",
            "options": [],
            "multiselect": false,
            "columns": 1,
            "dropdown": true,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || v.set_text(slots::INPUT_VALUE, d.read(keys::DEFAULT_VALUE).unwrap_or_default().to_string()));

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            v.set_flag(slots::INPUT_DISABLED, d.read(keys::DISABLED).unwrap_or(false));
            v.set_flag(slots::INPUT_READONLY, d.read(keys::READONLY).unwrap_or(false));
        });

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || v.set_text(slots::SELECT_PROMPT, d.read(PROMPT).unwrap_or_default()));

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || v.set_flag(slots::SELECT_DROPDOWN, d.read(DROPDOWN).unwrap_or(true)));

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            let input = if d.read(MULTISELECT).unwrap_or(false) { "checkbox" } else { "radio" };
            v.set_text(slots::OPTIONS_INPUT, input);
        });

        // Rebuilt whenever the option list is reassigned. Each option gets its
        // own effects, owned by this one and dropped on the next rebuild.
        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            let options = d.read(keys::OPTIONS).unwrap_or_default();
            v.set_flag(slots::OPTIONS_EMPTY, options.is_empty());

            let records: Vec<ReactiveObject> = options.iter().filter_map(Value::as_record).cloned().collect();
            v.set_items(
                slots::OPTIONS,
                records
                    .iter()
                    .map(|record| record.read_untracked(OPTION_VALUE).unwrap_or_default())
                    .collect(),
            );

            for (index, record) in records.into_iter().enumerate() {
                let (r, view) = (record.clone(), v.clone());
                create_effect(move || view.set_text(&option_slot(index, "value"), r.read(OPTION_VALUE).unwrap_or_default()));
                let view = v.clone();
                create_effect(move || view.set_text(&option_slot(index, "label"), record.read(keys::LABEL).unwrap_or_default()));
            }
        });
        Ok(())
    }
}

/// Append an option to `field`'s option list.
pub fn add_option(field: &FieldNode, option: SelectOption) -> Result<()> {
    let mut options = field.data().read_untracked(keys::OPTIONS)?;
    let record = ReactiveObject::from_json(&json!({
        "value": option.value,
        "label": option.label,
    }))?;
    options.push(Value::Record(record));
    field.data().write(keys::OPTIONS, options);
    debug!(field = %field.node_id(), "option added");
    Ok(())
}

/// Current options of `field`. Untracked.
pub fn options(field: &FieldNode) -> Result<Vec<SelectOption>> {
    let options = field.data().read_untracked(keys::OPTIONS)?;
    Ok(options
        .iter()
        .filter_map(Value::as_record)
        .filter_map(SelectOption::from_record)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::View;
    use crate::reactive::effect_scope;
    use crate::types::NodeId;

    fn select_data() -> ReactiveObject {
        let data = ReactiveObject::from_json(&json!({
            "defaultValue": "",
            "readonly": false,
            "disabled": false,
        }))
        .unwrap();
        if let serde_json::Value::Object(defaults) = SelectView.defaults() {
            for (name, value) in &defaults {
                data.set(name, Value::from_json(value));
            }
        }
        data
    }

    #[test]
    fn test_options_repaint_on_reassignment() {
        let (data, view) = (select_data(), View::new());
        let scope = effect_scope();
        scope
            .run(|| SelectView.initialize(&FieldContext { node: NodeId(0), data: &data, view: &view }))
            .unwrap();

        assert!(view.flag(slots::OPTIONS_EMPTY));
        assert_eq!(view.text_or_empty(slots::OPTIONS_INPUT), "radio");

        let options = Value::from_json(&json!([
            { "value": "a", "label": "Alpha" },
            { "value": "b", "label": "Beta" },
        ]));
        data.set("options", options);

        assert!(!view.flag(slots::OPTIONS_EMPTY));
        assert_eq!(view.items(slots::OPTIONS), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(view.text_or_empty(&option_slot(1, "label")), "Beta");

        // Per-option effects follow the option record itself.
        let first = data.peek("options").unwrap().as_list().unwrap()[0].as_record().cloned().unwrap();
        first.set("label", "First");
        assert_eq!(view.text_or_empty(&option_slot(0, "label")), "First");

        data.set("multiselect", true);
        assert_eq!(view.text_or_empty(slots::OPTIONS_INPUT), "checkbox");
        scope.stop();
    }
}
