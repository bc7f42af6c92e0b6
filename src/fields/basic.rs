//! Input and static content fields.

use serde_json::json;

use crate::error::Result;
use crate::nodes::{paint_input, slots, FieldContext, FieldView};
use crate::reactive::{create_effect, keys, Key};

const LEVEL: Key<f64> = Key::new("level");
const HTML: Key<String> = Key::new("html");

/// Paint `min`/`max`/`step` as `min:max:step`, leaving unset bounds empty.
fn paint_range(cx: &FieldContext<'_>) {
    let (d, v) = (cx.data.clone(), cx.view.clone());
    create_effect(move || {
        let part = |value: Option<f64>| value.map(|n| n.to_string()).unwrap_or_default();
        let min = part(d.read(keys::MIN).ok().flatten());
        let max = part(d.read(keys::MAX).ok().flatten());
        let step = part(d.read(keys::STEP).ok().flatten());
        v.set_text(slots::INPUT_RANGE, format!("{min}:{max}:{step}"));
    });
}

/// Paint static text from `key` into the content slot.
fn paint_content(cx: &FieldContext<'_>, key: Key<String>) {
    let (d, v) = (cx.data.clone(), cx.view.clone());
    create_effect(move || v.set_text(slots::CONTENT, d.read(key).unwrap_or_default()));
}

// =============================================================================
// Inputs
// =============================================================================

pub struct TextView;

impl FieldView for TextView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "Text Input",
            "placeholder": "",
            "min": 0,
            "max": 2000,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        paint_input(cx);
        Ok(())
    }
}

pub struct NumberView;

impl FieldView for NumberView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "Number Input",
            "placeholder": "",
            "min": 0,
            "max": 1000,
            "step": 1,
            "decimals": 0,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        paint_input(cx);
        paint_range(cx);
        Ok(())
    }
}

pub struct SliderView;

impl FieldView for SliderView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "Slider",
            "min": 0,
            "max": 100,
            "step": 1,
            "defaultValue": 50,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        paint_input(cx);
        paint_range(cx);
        Ok(())
    }
}

// =============================================================================
// Static content
// =============================================================================

pub struct HeadingView;

impl FieldView for HeadingView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "text": "Heading",
            "level": 2,
            "includeLabel": false,
            "layout": "block",
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        paint_content(cx, keys::TEXT);

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || {
            let level = d.read(LEVEL).unwrap_or(2.0).clamp(1.0, 6.0) as u8;
            v.set_text(slots::HEADING_LEVEL, level.to_string());
        });
        Ok(())
    }
}

pub struct ParagraphView;

impl FieldView for ParagraphView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "text": "Paragraph",
            "includeLabel": false,
            "layout": "block",
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        paint_content(cx, keys::TEXT);
        Ok(())
    }
}

/// Raw markup, handed to the host untouched.
pub struct HtmlView;

impl FieldView for HtmlView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "html": "",
            "includeLabel": false,
            "layout": "block",
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        paint_content(cx, HTML);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::View;
    use crate::reactive::{effect_scope, ReactiveObject, Value};
    use crate::types::NodeId;

    fn context(view: &dyn FieldView) -> (ReactiveObject, View) {
        let data = ReactiveObject::from_json(&json!({
            "defaultValue": "",
            "placeholder": "",
            "readonly": false,
            "disabled": false,
        }))
        .unwrap();
        if let serde_json::Value::Object(defaults) = view.defaults() {
            for (name, value) in &defaults {
                data.set(name, Value::from_json(value));
            }
        }
        (data, View::new())
    }

    #[test]
    fn test_number_paints_range() {
        let mut number = NumberView;
        let (data, view) = context(&number);
        let scope = effect_scope();
        scope
            .run(|| number.initialize(&FieldContext { node: NodeId(0), data: &data, view: &view }))
            .unwrap();

        assert_eq!(view.text_or_empty(slots::INPUT_RANGE), "0:1000:1");
        data.set("max", Value::Null);
        assert_eq!(view.text_or_empty(slots::INPUT_RANGE), "0::1");
        scope.stop();
    }

    #[test]
    fn test_heading_level_is_clamped() {
        let mut heading = HeadingView;
        let (data, view) = context(&heading);
        let scope = effect_scope();
        scope
            .run(|| heading.initialize(&FieldContext { node: NodeId(0), data: &data, view: &view }))
            .unwrap();

        assert_eq!(view.text_or_empty(slots::CONTENT), "Heading");
        assert_eq!(view.text_or_empty(slots::HEADING_LEVEL), "2");
        data.set("level", 9);
        assert_eq!(view.text_or_empty(slots::HEADING_LEVEL), "6");
        scope.stop();
    }

    #[test]
    fn test_slider_shows_default_value() {
        let mut slider = SliderView;
        let (data, view) = context(&slider);
        let scope = effect_scope();
        scope
            .run(|| slider.initialize(&FieldContext { node: NodeId(0), data: &data, view: &view }))
            .unwrap();
        assert_eq!(view.text_or_empty(slots::INPUT_VALUE), "50");
        scope.stop();
    }
}
