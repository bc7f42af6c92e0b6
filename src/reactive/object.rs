//! Reactive records.
//!
//! A [`ReactiveObject`] is a map of named fields where every field is its own
//! [`Reactive<Value>`]. An effect reading `label` is re-run when `label` is
//! written and never when `name` is.
//!
//! Reading a field that was never declared is an error. Writing one declares
//! it; effects that previously failed to read it are not notified.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Map;

use super::cell::Reactive;
use super::value::{FromValue, Value};
use crate::error::{FormError, Result};

#[derive(Clone)]
pub struct ReactiveObject(Rc<RefCell<IndexMap<String, Reactive<Value>>>>);

impl ReactiveObject {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(IndexMap::new())))
    }

    /// Build a record whose fields are the keys of a JSON object.
    pub fn from_json(record: &serde_json::Value) -> Result<Self> {
        match record {
            serde_json::Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(FormError::NotARecord(json_type_name(other))),
        }
    }

    pub(crate) fn from_map(map: &Map<String, serde_json::Value>) -> Self {
        let fields = map
            .iter()
            .map(|(name, value)| (name.clone(), Reactive::new(Value::from_json(value))))
            .collect();
        Self(Rc::new(RefCell::new(fields)))
    }

    /// The reactive cell behind a field.
    pub fn cell(&self, name: &str) -> Result<Reactive<Value>> {
        self.0
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Read a field, tracking it.
    pub fn get(&self, name: &str) -> Result<Value> {
        Ok(self.cell(name)?.get())
    }

    /// Read a field without tracking.
    pub fn peek(&self, name: &str) -> Result<Value> {
        Ok(self.cell(name)?.get_untracked())
    }

    /// Write a field, declaring it if needed.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let existing = self.0.borrow().get(name).cloned();
        match existing {
            Some(cell) => cell.set(value),
            None => {
                self.0.borrow_mut().insert(name.to_string(), Reactive::new(value));
            }
        }
    }

    /// Typed, tracked read.
    pub fn read<T: FromValue>(&self, key: Key<T>) -> Result<T> {
        convert(key.name, self.get(key.name)?)
    }

    /// Typed, untracked read.
    pub fn read_untracked<T: FromValue>(&self, key: Key<T>) -> Result<T> {
        convert(key.name, self.peek(key.name)?)
    }

    pub fn write<T: Into<Value>>(&self, key: Key<T>, value: T) {
        self.set(key.name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.0.borrow().get(name).map_or(0, Reactive::subscriber_count)
    }

    /// Serialize every field, tracking each read.
    pub fn to_json(&self) -> serde_json::Value {
        let cells: Vec<(String, Reactive<Value>)> = self
            .0
            .borrow()
            .iter()
            .map(|(name, cell)| (name.clone(), cell.clone()))
            .collect();
        let map: Map<String, serde_json::Value> = cells
            .into_iter()
            .map(|(name, cell)| (name, cell.with(Value::to_json)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Serialize every field without tracking.
    pub fn snapshot(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .0
            .borrow()
            .iter()
            .map(|(name, cell)| (name.clone(), cell.with_untracked(Value::to_json_untracked)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// An independent record with the same field values.
    pub fn deep_clone(&self) -> ReactiveObject {
        match self.snapshot() {
            serde_json::Value::Object(map) => Self::from_map(&map),
            _ => Self::new(),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn convert<T: FromValue>(name: &str, value: Value) -> Result<T> {
    let found = value.type_name();
    T::from_value(value).ok_or_else(|| FormError::TypeMismatch {
        field: name.to_string(),
        expected: T::EXPECTED,
        found,
    })
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Default for ReactiveObject {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ReactiveObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(fields) => f.debug_set().entries(fields.keys()).finish(),
            Err(_) => f.write_str("ReactiveObject(<borrowed>)"),
        }
    }
}

// =============================================================================
// Typed keys
// =============================================================================

/// A field name paired with the type it is read as.
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// Field names shared by sections and fields.
pub mod keys {
    use super::Key;
    use crate::reactive::value::Value;

    pub const ID: Key<String> = Key::new("id");
    pub const TYPE: Key<String> = Key::new("type");
    pub const NAME: Key<String> = Key::new("name");
    pub const LABEL: Key<String> = Key::new("label");
    pub const DESCRIPTION: Key<String> = Key::new("description");
    pub const PLACEHOLDER: Key<String> = Key::new("placeholder");
    pub const LAYOUT: Key<String> = Key::new("layout");
    pub const INCLUDE_LABEL: Key<bool> = Key::new("includeLabel");
    pub const DEFAULT_VALUE: Key<Value> = Key::new("defaultValue");
    pub const REQUIRED: Key<bool> = Key::new("required");
    pub const READONLY: Key<bool> = Key::new("readonly");
    pub const DISABLED: Key<bool> = Key::new("disabled");
    pub const HIDDEN: Key<bool> = Key::new("hidden");
    pub const MIN: Key<Option<f64>> = Key::new("min");
    pub const MAX: Key<Option<f64>> = Key::new("max");
    pub const STEP: Key<Option<f64>> = Key::new("step");
    pub const OPTIONS: Key<Vec<Value>> = Key::new("options");
    pub const TEXT: Key<String> = Key::new("text");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::create_effect;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_fields_are_independently_tracked() {
        let data = ReactiveObject::from_json(&json!({ "label": "A", "name": "a" })).unwrap();
        let runs = Rc::new(Cell::new(0));

        let (d, r) = (data.clone(), runs.clone());
        let _effect = create_effect(move || {
            let _ = d.read(keys::LABEL);
            r.set(r.get() + 1);
        });

        data.set("name", "b");
        assert_eq!(runs.get(), 1);
        data.set("label", "B");
        assert_eq!(runs.get(), 2);
        assert_eq!(data.subscriber_count("label"), 1);
        assert_eq!(data.subscriber_count("name"), 0);
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let data = ReactiveObject::new();
        assert_eq!(data.get("missing"), Err(FormError::UnknownField("missing".into())));
    }

    #[test]
    fn test_write_declares_new_field() {
        let data = ReactiveObject::new();
        data.write(keys::HIDDEN, true);
        assert_eq!(data.read(keys::HIDDEN), Ok(true));
        assert_eq!(data.field_names(), vec!["hidden".to_string()]);
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let data = ReactiveObject::from_json(&json!({ "label": 4 })).unwrap();
        let err = data.read(keys::LABEL).unwrap_err();
        assert_eq!(
            err,
            FormError::TypeMismatch {
                field: "label".into(),
                expected: "text",
                found: "number",
            }
        );
    }

    #[test]
    fn test_non_object_json_rejected() {
        assert_eq!(
            ReactiveObject::from_json(&json!([1, 2])),
            Err(FormError::NotARecord("array"))
        );
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let data = ReactiveObject::from_json(&json!({ "label": "A", "nested": { "x": 1 } })).unwrap();
        let copy = data.deep_clone();

        copy.set("label", "B");
        assert_eq!(data.peek("label"), Ok(Value::Text("A".into())));
        assert_eq!(copy.snapshot(), json!({ "label": "B", "nested": { "x": 1 } }));
        assert!(!data.ptr_eq(&copy));
    }

    #[test]
    fn test_to_json_preserves_declaration_order() {
        let data = ReactiveObject::from_json(&json!({ "b": 1, "a": 2 })).unwrap();
        data.set("c", 3);
        let names: Vec<String> = data.to_json().as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
