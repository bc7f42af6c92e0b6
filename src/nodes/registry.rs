//! Field type registry - maps a palette tag to the view that implements it.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::field::{FieldNode, FieldView};
use crate::config::DesignerConfig;
use crate::error::{FormError, Result};

/// Builds the view for a new field. Receives the tag it was registered under.
pub type FieldFactory = Rc<dyn Fn(&str) -> Box<dyn FieldView>>;

thread_local! {
    static FIELD_TYPES: RefCell<IndexMap<String, FieldFactory>> = RefCell::new(IndexMap::new());
}

/// Register (or replace) the constructor for `tag`.
pub fn register_field_type<F>(tag: &str, factory: F)
where
    F: Fn(&str) -> Box<dyn FieldView> + 'static,
{
    let replaced = FIELD_TYPES.with(|types| {
        types
            .borrow_mut()
            .insert(tag.to_string(), Rc::new(factory))
            .is_some()
    });
    debug!(tag, replaced, "field type registered");
}

pub fn is_registered(tag: &str) -> bool {
    FIELD_TYPES.with(|types| types.borrow().contains_key(tag))
}

/// Registered tags in registration order.
pub fn registered_tags() -> Vec<String> {
    FIELD_TYPES.with(|types| types.borrow().keys().cloned().collect())
}

/// Attributes the view for `tag` adds to the base set.
pub fn type_defaults(tag: &str) -> Option<serde_json::Value> {
    let factory = FIELD_TYPES.with(|types| types.borrow().get(tag).cloned())?;
    Some(factory(tag).defaults())
}

/// Build a detached field of type `tag` with element id `id`.
pub fn instantiate(tag: &str, id: &str, config: &DesignerConfig) -> Result<FieldNode> {
    let factory = FIELD_TYPES.with(|types| types.borrow().get(tag).cloned());
    let Some(factory) = factory else {
        warn!(tag, "unknown field type");
        return Err(FormError::UnknownFieldType(tag.to_string()));
    };
    if crate::engine::get_index(id).is_some() {
        return Err(FormError::DuplicateId(id.to_string()));
    }
    FieldNode::create(tag, factory(tag), id, config)
}

pub fn reset_field_types() {
    FIELD_TYPES.with(|types| types.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reset_registry;
    use crate::nodes::field::FieldContext;
    use crate::nodes::reset_nodes;
    use serde_json::json;

    struct Plain;

    impl FieldView for Plain {
        fn defaults(&self) -> serde_json::Value {
            json!({ "label": "Plain" })
        }

        fn initialize(&mut self, _cx: &FieldContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn setup() {
        reset_nodes();
        reset_registry();
        reset_field_types();
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        setup();
        let err = instantiate("nope", "TF-00001", &DesignerConfig::default()).unwrap_err();
        assert_eq!(err, FormError::UnknownFieldType("nope".into()));
        assert_eq!(crate::engine::get_allocated_count(), 0);
    }

    #[test]
    fn test_instantiate_applies_type_defaults() {
        setup();
        register_field_type("plain", |_| Box::new(Plain));
        let field = instantiate("plain", "TF-00001", &DesignerConfig::default()).unwrap();

        assert_eq!(field.tag(), "plain");
        assert_eq!(field.id(), "TF-00001");
        assert_eq!(field.data().get("label").unwrap().as_str(), Some("Plain"));
        assert_eq!(field.data().get("type").unwrap().as_str(), Some("plain"));
        assert!(!field.is_live());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        setup();
        register_field_type("plain", |_| Box::new(Plain));
        instantiate("plain", "TF-00001", &DesignerConfig::default()).unwrap();
        let err = instantiate("plain", "TF-00001", &DesignerConfig::default()).unwrap_err();
        assert_eq!(err, FormError::DuplicateId("TF-00001".into()));
    }

    #[test]
    fn test_tags_keep_registration_order() {
        setup();
        register_field_type("b", |_| Box::new(Plain));
        register_field_type("a", |_| Box::new(Plain));
        register_field_type("b", |_| Box::new(Plain));
        assert_eq!(registered_tags(), vec!["b".to_string(), "a".to_string()]);
        assert!(is_registered("a"));
    }
}
