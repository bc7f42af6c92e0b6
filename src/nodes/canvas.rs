//! Canvas: the root of a form document.
//!
//! The canvas owns the form-level registries. Every field and section that
//! becomes live is recorded here from its bubbling `add-*` event and dropped
//! again on `remove-*` or `delete-field`. Edit requests from any node land
//! here too and set the current edit target.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::{json, Map};
use tracing::{debug, info};

use super::field::FieldNode;
use super::registry;
use super::section::SectionNode;
use super::store::{self, Node};
use super::structure;
use crate::config::DesignerConfig;
use crate::engine::{self, tree};
use crate::error::Result;
use crate::events::bubble::{self, BubbleEvent, Propagation};
use crate::reactive::{Reactive, ReactiveObject};
use crate::types::{Cleanup, NodeId, NodeKind, Placement};

struct CanvasInner {
    root: NodeId,
    config: DesignerConfig,
    fields: Reactive<IndexMap<String, ReactiveObject>>,
    sections: Reactive<IndexMap<String, ReactiveObject>>,
    edit_target: Reactive<Option<(NodeId, String)>>,
    listener: RefCell<Option<Cleanup>>,
}

#[derive(Clone)]
pub struct Canvas(Rc<CanvasInner>);

thread_local! {
    static CANVASES: RefCell<HashMap<NodeId, Weak<CanvasInner>>> = RefCell::new(HashMap::new());
}

/// The canvas whose document contains `node`.
pub fn canvas_of(node: NodeId) -> Option<Canvas> {
    let root = tree::root_of(node);
    CANVASES.with(|canvases| canvases.borrow().get(&root).and_then(Weak::upgrade).map(Canvas))
}

impl Canvas {
    pub fn new(config: DesignerConfig) -> Result<Canvas> {
        config.validate()?;
        let root = engine::allocate_index(None)?;
        tree::insert_node(root, NodeKind::Canvas);

        let canvas = Canvas(Rc::new(CanvasInner {
            root,
            config,
            fields: Reactive::new(IndexMap::new()),
            sections: Reactive::new(IndexMap::new()),
            edit_target: Reactive::new(None),
            listener: RefCell::new(None),
        }));

        let weak = Rc::downgrade(&canvas.0);
        let cleanup = bubble::on_node(root, move |event, _| {
            if let Some(inner) = weak.upgrade() {
                Canvas(inner).handle_event(event);
            }
            Propagation::Continue
        });
        *canvas.0.listener.borrow_mut() = Some(Box::new(cleanup));

        CANVASES.with(|canvases| {
            canvases.borrow_mut().insert(root, Rc::downgrade(&canvas.0));
        });
        info!(form = %canvas.0.config.form_name, %root, "canvas created");
        Ok(canvas)
    }

    pub fn root(&self) -> NodeId {
        self.0.root
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.0.config
    }

    fn handle_event(&self, event: &BubbleEvent) {
        match event {
            BubbleEvent::AddField { id, data, .. } => {
                self.0.fields.update(|fields| {
                    fields.insert(id.clone(), data.clone());
                });
            }
            BubbleEvent::RemoveField { id, .. } | BubbleEvent::DeleteField { id } => {
                self.0.fields.update(|fields| {
                    fields.shift_remove(id);
                });
            }
            BubbleEvent::AddSection { id, data, .. } => {
                self.0.sections.update(|sections| {
                    sections.insert(id.clone(), data.clone());
                });
            }
            BubbleEvent::RemoveSection { id, .. } => {
                self.0.sections.update(|sections| {
                    sections.shift_remove(id);
                });
            }
            BubbleEvent::EditField { field: node } | BubbleEvent::EditSection { section: node } => {
                if let Some(id) = engine::get_id(*node) {
                    debug!(%node, %id, "edit target changed");
                    self.0.edit_target.set(Some((*node, id)));
                }
            }
            BubbleEvent::Delete { .. } | BubbleEvent::Copy { .. } => {}
        }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Build a detached field of type `tag` with the next element id.
    pub fn create_field(&self, tag: &str) -> Result<FieldNode> {
        let config = &self.0.config;
        let id = engine::generate_id(&config.form_acronym, config.id_width);
        registry::instantiate(tag, &id, config)
    }

    /// Build a detached section with the next element id.
    pub fn create_section(&self) -> Result<SectionNode> {
        let config = &self.0.config;
        let id = engine::generate_id(&config.form_acronym, config.id_width);
        SectionNode::create(&id, config)
    }

    /// Append a new section to the form.
    pub fn add_section(&self) -> Result<SectionNode> {
        self.insert_section(Placement::Append(self.0.root))
    }

    pub fn insert_section(&self, placement: Placement) -> Result<SectionNode> {
        structure::validate_placement(NodeKind::Section, None, placement)?;
        let section = self.create_section()?;
        structure::attach(&Node::Section(section.clone()), placement)?;
        Ok(section)
    }

    /// Create a field of type `tag` and place it.
    pub fn insert_field(&self, tag: &str, placement: Placement) -> Result<FieldNode> {
        structure::validate_placement(NodeKind::Field, None, placement)?;
        let field = self.create_field(tag)?;
        structure::attach(&Node::Field(field.clone()), placement)?;
        Ok(field)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live sections in document order.
    pub fn sections(&self) -> Vec<SectionNode> {
        tree::children_of(self.0.root)
            .into_iter()
            .filter_map(store::get_section)
            .collect()
    }

    /// Live fields in document order.
    pub fn fields(&self) -> Vec<FieldNode> {
        self.sections().iter().flat_map(SectionNode::fields).collect()
    }

    /// Ids in the form-level field registry, in registration order. Tracked.
    pub fn field_ids(&self) -> Vec<String> {
        self.0.fields.with(|fields| fields.keys().cloned().collect())
    }

    pub fn section_ids(&self) -> Vec<String> {
        self.0.sections.with(|sections| sections.keys().cloned().collect())
    }

    pub fn field_data(&self, id: &str) -> Option<ReactiveObject> {
        self.0.fields.with(|fields| fields.get(id).cloned())
    }

    pub fn section_data(&self, id: &str) -> Option<ReactiveObject> {
        self.0.sections.with(|sections| sections.get(id).cloned())
    }

    /// The node currently being edited, if it still exists. Tracked.
    pub fn edit_target(&self) -> Option<NodeId> {
        let (node, id) = self.0.edit_target.get()?;
        (engine::get_id(node).as_deref() == Some(id.as_str())).then_some(node)
    }

    /// Serialize the form: sections in order, each with its fields.
    pub fn to_json(&self) -> serde_json::Value {
        let sections: Vec<serde_json::Value> = self
            .sections()
            .into_iter()
            .map(|section| {
                let mut record = match section.data().to_json() {
                    serde_json::Value::Object(map) => map,
                    _ => Map::new(),
                };
                let fields: Vec<serde_json::Value> =
                    section.fields().iter().map(|field| field.data().to_json()).collect();
                record.insert("fields".into(), serde_json::Value::Array(fields));
                serde_json::Value::Object(record)
            })
            .collect();

        json!({
            "name": self.0.config.form_name,
            "acronym": self.0.config.form_acronym,
            "sections": sections,
        })
    }

    /// Destroy every node and detach the canvas.
    pub fn dispose(&self) {
        if let Some(cleanup) = self.0.listener.borrow_mut().take() {
            cleanup();
        }
        CANVASES.with(|canvases| {
            canvases.borrow_mut().remove(&self.0.root);
        });
        engine::release_index(self.0.root);
    }
}

pub(crate) fn reset_canvases() {
    CANVASES.with(|canvases| canvases.borrow_mut().clear());
}
