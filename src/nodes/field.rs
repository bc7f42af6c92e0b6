//! Field nodes.
//!
//! A [`FieldNode`] is the shared shell of every form field: reactive data,
//! label and description painting, highlight, drop zones and lifecycle. The
//! type-specific part lives behind the [`FieldView`] trait.
//!
//! # Lifecycle
//!
//! - First connection: base effects and the view's own effects are created
//!   once, inside the node's scope; then listeners are set up.
//! - Every later connection (after a move): listeners only.
//! - Every connection ends by dispatching `add-field` at the node.
//! - Disconnection dispatches `remove-field` while the node is still linked,
//!   then drops the listeners. The effects stay alive until destruction.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use tracing::{debug, warn};

use super::drop_zone::DropZones;
use super::highlight::Highlight;
use super::store::{self, Node};
use super::structure;
use super::view::{View, slots};
use crate::config::DesignerConfig;
use crate::engine::{self, tree, Connect, Lifecycle, LifecycleCell};
use crate::error::Result;
use crate::events::bubble::{self, BubbleEvent, Propagation};
use crate::events::{on_broadcast, BroadcastEvent};
use crate::reactive::{create_effect, effect_scope, keys, EffectScope, ReactiveObject, Value};
use crate::state::animate::{animate_enter, cancel_animations};
use crate::types::{Cleanup, NodeId, NodeKind};

// =============================================================================
// FieldView
// =============================================================================

/// What a field view gets to work with.
pub struct FieldContext<'a> {
    pub node: NodeId,
    pub data: &'a ReactiveObject,
    pub view: &'a View,
}

/// The type-specific part of a field.
pub trait FieldView {
    /// Attributes this field type adds to, or overrides in, the base set.
    fn defaults(&self) -> serde_json::Value;

    /// Create the effects that paint this field's input. Runs once, inside
    /// the node's scope.
    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()>;

    /// Register listeners for one connection. The returned cleanups run on
    /// disconnection.
    fn setup(&mut self, _cx: &FieldContext<'_>) -> Result<Vec<Cleanup>> {
        Ok(Vec::new())
    }

    /// The user committed text in the preview input. Previews are not
    /// editable, so the default restores the configured default value.
    fn commit_input(&mut self, cx: &FieldContext<'_>, _input: &str) {
        let default = cx.data.read_untracked(keys::DEFAULT_VALUE).unwrap_or_default();
        cx.view.set_text(slots::INPUT_VALUE, default.to_string());
    }
}

/// Attributes every field carries.
fn base_attributes(tag: &str, id: &str, config: &DesignerConfig) -> serde_json::Value {
    json!({
        "id": id,
        "type": tag,
        "name": tag,
        "label": "",
        "description": "",
        "layout": config.default_layout.as_str(),
        "includeLabel": true,
        "defaultValue": "",
        "required": false,
        "readonly": false,
        "disabled": false,
        "hidden": false,
    })
}

// =============================================================================
// FieldNode
// =============================================================================

struct FieldInner {
    node: NodeId,
    tag: String,
    data: ReactiveObject,
    view: View,
    highlight: Highlight,
    zones: DropZones,
    behavior: RefCell<Box<dyn FieldView>>,
    scope: EffectScope,
    lifecycle: LifecycleCell,
    listeners: RefCell<Vec<Cleanup>>,
    animation_ms: u64,
}

#[derive(Clone)]
pub struct FieldNode(Rc<FieldInner>);

impl std::fmt::Debug for FieldNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldNode")
            .field("node", &self.0.node)
            .field("tag", &self.0.tag)
            .finish_non_exhaustive()
    }
}

impl FieldNode {
    /// Build a detached field with id `id`.
    pub(crate) fn create(
        tag: &str,
        behavior: Box<dyn FieldView>,
        id: &str,
        config: &DesignerConfig,
    ) -> Result<FieldNode> {
        let data = ReactiveObject::from_json(&base_attributes(tag, id, config))?;
        if let serde_json::Value::Object(defaults) = behavior.defaults() {
            for (name, value) in &defaults {
                data.set(name, Value::from_json(value));
            }
        }
        data.write(keys::ID, id.to_string());

        let node = engine::allocate_index(Some(id))?;
        tree::insert_node(node, NodeKind::Field);

        let field = FieldNode(Rc::new(FieldInner {
            node,
            tag: tag.to_string(),
            data,
            view: View::new(),
            highlight: Highlight::new(node),
            zones: DropZones::new(node),
            behavior: RefCell::new(behavior),
            scope: effect_scope(),
            lifecycle: LifecycleCell::new(node),
            listeners: RefCell::new(Vec::new()),
            animation_ms: config.animation_ms,
        }));

        store::insert(Node::Field(field.clone()));
        let owned = field.clone();
        engine::on_destroy(node, move || owned.teardown());

        debug!(%node, tag, id, "field created");
        Ok(field)
    }

    pub fn node_id(&self) -> NodeId {
        self.0.node
    }

    /// Registry tag this field was created from.
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn data(&self) -> &ReactiveObject {
        &self.0.data
    }

    pub fn view(&self) -> &View {
        &self.0.view
    }

    pub fn highlight(&self) -> &Highlight {
        &self.0.highlight
    }

    pub fn zones(&self) -> &DropZones {
        &self.0.zones
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.0.lifecycle.get()
    }

    pub fn is_live(&self) -> bool {
        self.lifecycle().is_live()
    }

    /// Element id (`TF-00001`). Untracked.
    pub fn id(&self) -> String {
        self.0.data.read_untracked(keys::ID).unwrap_or_default()
    }

    /// Containing section, if attached.
    pub fn section(&self) -> Option<NodeId> {
        tree::parent_of(self.0.node)
    }

    fn with_context<R>(&self, f: impl FnOnce(&mut dyn FieldView, &FieldContext<'_>) -> R) -> R {
        let inner = &self.0;
        let cx = FieldContext {
            node: inner.node,
            data: &inner.data,
            view: &inner.view,
        };
        let mut behavior = inner.behavior.borrow_mut();
        f(behavior.as_mut(), &cx)
    }

    /// Forward committed preview input to the field view.
    pub fn commit_input(&self, input: &str) {
        self.with_context(|behavior, cx| behavior.commit_input(cx, input));
    }

    /// Mark this field active and ask to become the edit target.
    pub fn send_edit_event(&self) {
        self.0.highlight.activate();
        let field = self.0.node;
        bubble::dispatch(field, BubbleEvent::EditField { field });
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub(crate) fn connect(&self) -> Result<()> {
        match self.0.lifecycle.begin_connect()? {
            Connect::AlreadyLive => return Ok(()),
            Connect::Initialize => {
                self.initialize()?;
                self.setup()?;
            }
            Connect::Reconnect => self.setup()?,
        }
        self.0.lifecycle.transition(Lifecycle::Live)?;

        let field = self.0.node;
        bubble::dispatch(
            field,
            BubbleEvent::AddField {
                field,
                id: self.id(),
                data: self.0.data.clone(),
            },
        );
        Ok(())
    }

    fn initialize(&self) -> Result<()> {
        let inner = &self.0;
        inner.scope.run(|| {
            paint_base(&inner.data, &inner.view, &inner.highlight, &inner.tag);
            inner.highlight.paint(&inner.view);
            inner.zones.paint(&inner.view);
            self.with_context(|behavior, cx| behavior.initialize(cx))
        })?;

        animate_enter(inner.node, inner.animation_ms);
        self.send_edit_event();
        Ok(())
    }

    fn setup(&self) -> Result<()> {
        let mut cleanups = self.base_listeners();
        cleanups.extend(self.with_context(|behavior, cx| behavior.setup(cx))?);
        self.0.listeners.borrow_mut().extend(cleanups);
        Ok(())
    }

    fn base_listeners(&self) -> Vec<Cleanup> {
        let node = self.0.node;

        let field = self.clone();
        let on_delete = bubble::on_node(node, move |event, _| match event {
            BubbleEvent::Delete { origin } if *origin == node => {
                structure::remove_node(node, field.0.animation_ms);
                Propagation::Stop
            }
            BubbleEvent::Copy { origin } if *origin == node => {
                if let Err(err) = structure::duplicate_field(&field) {
                    warn!(%node, %err, "copy failed");
                }
                Propagation::Stop
            }
            _ => Propagation::Continue,
        });

        let (zones, highlight) = (self.0.zones.clone(), self.0.highlight.clone());
        let on_window = on_broadcast(move |event| match event {
            BroadcastEvent::CreatingField { .. } => zones.show(),
            BroadcastEvent::MovingField { node: dragged } if *dragged != node => zones.show(),
            BroadcastEvent::CreatedField | BroadcastEvent::MovedField { .. } => zones.hide(),
            BroadcastEvent::PointerDown { target } => {
                if !target.is_some_and(|target| tree::contains(node, target)) {
                    highlight.deactivate();
                }
            }
            _ => {}
        });

        let cleanups: Vec<Cleanup> = vec![Box::new(on_delete), Box::new(on_window)];
        cleanups
    }

    /// Announce removal while still linked, then drop listeners.
    pub(crate) fn disconnect(&self) {
        if !self.is_live() {
            return;
        }
        let field = self.0.node;
        bubble::dispatch(field, BubbleEvent::RemoveField { field, id: self.id() });
        self.drop_listeners();
        self.0.zones.hide();
        if let Err(err) = self.0.lifecycle.transition(Lifecycle::Detached) {
            warn!(%field, %err, "disconnect from unexpected state");
        }
    }

    fn drop_listeners(&self) {
        let listeners = std::mem::take(&mut *self.0.listeners.borrow_mut());
        for cleanup in listeners {
            cleanup();
        }
    }

    /// Final teardown, run by the registry when the node is released.
    fn teardown(&self) {
        self.drop_listeners();
        self.0.scope.stop();
        let _ = self.0.lifecycle.transition(Lifecycle::Destroyed);
        cancel_animations(self.0.node);
        bubble::clear_node(self.0.node);
        store::remove(self.0.node);
        debug!(node = %self.0.node, "field destroyed");
    }
}

/// Effects shared by every field type.
fn paint_base(data: &ReactiveObject, view: &View, highlight: &Highlight, tag: &str) {
    highlight.set_name(tag);

    let (d, v) = (data.clone(), view.clone());
    create_effect(move || {
        let label = d.read(keys::LABEL).unwrap_or_default();
        v.set_flag(slots::LABEL_VISIBLE, !label.is_empty());
        v.set_text(slots::LABEL, label);
    });

    let (d, v) = (data.clone(), view.clone());
    create_effect(move || v.set_flag(slots::REQUIRED_MARK, d.read(keys::REQUIRED).unwrap_or(false)));

    let (d, v) = (data.clone(), view.clone());
    create_effect(move || {
        let description = d.read(keys::DESCRIPTION).unwrap_or_default();
        v.set_flag(slots::DESCRIPTION_VISIBLE, !description.is_empty());
        v.set_text(slots::DESCRIPTION, description);
    });

    let (d, h) = (data.clone(), highlight.clone());
    create_effect(move || {
        if d.read(keys::HIDDEN).unwrap_or(false) {
            h.set_state(Some("[Hidden]"));
        } else if d.read(keys::READONLY).unwrap_or(false) {
            h.set_state(Some("[Readonly]"));
        } else {
            h.set_state(None);
        }
    });

    let (d, v) = (data.clone(), view.clone());
    create_effect(move || v.set_flag(slots::DIMMED, d.read(keys::HIDDEN).unwrap_or(false)));

    let (d, v) = (data.clone(), view.clone());
    create_effect(move || {
        let inline = d.read(keys::LAYOUT).is_ok_and(|layout| layout == "inline")
            && d.read(keys::LABEL).is_ok_and(|label| !label.is_empty());
        v.set_flag(slots::INLINE, inline);
    });
}

/// Effects painting a plain text-like input from the common attributes.
pub(crate) fn paint_input(cx: &FieldContext<'_>) {
    let (d, v) = (cx.data.clone(), cx.view.clone());
    create_effect(move || {
        let value = d.read(keys::DEFAULT_VALUE).unwrap_or_default();
        v.set_text(slots::INPUT_VALUE, value.to_string());
    });

    let (d, v) = (cx.data.clone(), cx.view.clone());
    create_effect(move || {
        let placeholder = d.read(keys::PLACEHOLDER).unwrap_or_default();
        v.set_text(slots::INPUT_PLACEHOLDER, placeholder);
    });

    let (d, v) = (cx.data.clone(), cx.view.clone());
    create_effect(move || {
        v.set_flag(slots::INPUT_READONLY, d.read(keys::READONLY).unwrap_or(false));
        v.set_flag(slots::INPUT_DISABLED, d.read(keys::DISABLED).unwrap_or(false));
    });
}
