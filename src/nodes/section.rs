//! Section nodes: titled containers holding an ordered list of fields.
//!
//! A section keeps the ids of its fields in document order. The list is
//! maintained only from `add-field` and `remove-field` events bubbling up
//! from its children, and drives the "drag an element here" placeholder.

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
use crate::reactive::{create_effect, effect_scope, keys, EffectScope, Reactive, ReactiveObject};
use crate::state::animate::{animate_enter, cancel_animations};
use crate::types::{Cleanup, NodeId, NodeKind};

struct SectionInner {
    node: NodeId,
    data: ReactiveObject,
    fields: Reactive<Vec<String>>,
    view: View,
    highlight: Highlight,
    zones: DropZones,
    scope: EffectScope,
    lifecycle: LifecycleCell,
    listeners: RefCell<Vec<Cleanup>>,
    animation_ms: u64,
}

#[derive(Clone)]
pub struct SectionNode(Rc<SectionInner>);

impl SectionNode {
    pub(crate) fn create(id: &str, config: &DesignerConfig) -> Result<SectionNode> {
        let data = ReactiveObject::from_json(&json!({
            "id": id,
            "name": "section",
            "label": "Section",
            "description": "",
            "hidden": false,
        }))?;

        let node = engine::allocate_index(Some(id))?;
        tree::insert_node(node, NodeKind::Section);

        let section = SectionNode(Rc::new(SectionInner {
            node,
            data,
            fields: Reactive::new(Vec::new()),
            view: View::new(),
            highlight: Highlight::new(node),
            zones: DropZones::new(node),
            scope: effect_scope(),
            lifecycle: LifecycleCell::new(node),
            listeners: RefCell::new(Vec::new()),
            animation_ms: config.animation_ms,
        }));

        store::insert(Node::Section(section.clone()));
        let owned = section.clone();
        engine::on_destroy(node, move || owned.teardown());

        debug!(%node, id, "section created");
        Ok(section)
    }

    pub fn node_id(&self) -> NodeId {
        self.0.node
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

    pub fn id(&self) -> String {
        self.0.data.read_untracked(keys::ID).unwrap_or_default()
    }

    /// Ids of the contained fields, in document order. Tracked.
    pub fn field_ids(&self) -> Vec<String> {
        self.0.fields.get()
    }

    pub fn is_empty(&self) -> bool {
        self.0.fields.with(Vec::is_empty)
    }

    /// Live field nodes in document order.
    pub fn fields(&self) -> Vec<super::FieldNode> {
        tree::children_of(self.0.node)
            .into_iter()
            .filter_map(store::get_field)
            .collect()
    }

    pub fn send_edit_event(&self) {
        self.0.highlight.activate();
        let section = self.0.node;
        bubble::dispatch(section, BubbleEvent::EditSection { section });
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub(crate) fn connect(&self) -> Result<()> {
        match self.0.lifecycle.begin_connect()? {
            Connect::AlreadyLive => return Ok(()),
            Connect::Initialize => {
                self.initialize();
                self.setup();
            }
            Connect::Reconnect => self.setup(),
        }
        self.0.lifecycle.transition(Lifecycle::Live)?;

        let section = self.0.node;
        bubble::dispatch(
            section,
            BubbleEvent::AddSection {
                section,
                id: self.id(),
                data: self.0.data.clone(),
            },
        );
        Ok(())
    }

    fn initialize(&self) {
        let inner = &self.0;
        inner.scope.run(|| {
            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || v.set_text(slots::LABEL, d.read(keys::LABEL).unwrap_or_default()));

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || {
                let description = d.read(keys::DESCRIPTION).unwrap_or_default();
                v.set_flag(slots::DESCRIPTION_VISIBLE, !description.is_empty());
                v.set_text(slots::DESCRIPTION, description);
            });

            let (d, h) = (inner.data.clone(), inner.highlight.clone());
            create_effect(move || h.set_name(d.read(keys::NAME).unwrap_or_default()));

            let (d, h, v) = (inner.data.clone(), inner.highlight.clone(), inner.view.clone());
            create_effect(move || {
                let hidden = d.read(keys::HIDDEN).unwrap_or(false);
                h.set_state(hidden.then_some("[Hidden]"));
                v.set_flag(slots::DIMMED, hidden);
            });

            let (f, v) = (inner.fields.clone(), inner.view.clone());
            create_effect(move || v.set_flag(slots::EMPTY_PLACEHOLDER, f.with(Vec::is_empty)));

            inner.highlight.paint(&inner.view);
            inner.zones.paint(&inner.view);
        });

        animate_enter(inner.node, inner.animation_ms);
        self.send_edit_event();
    }

    fn setup(&self) {
        let node = self.0.node;

        let section = self.clone();
        let on_event = bubble::on_node(node, move |event, _| section.handle_event(event));

        let (zones, highlight) = (self.0.zones.clone(), self.0.highlight.clone());
        let on_window = on_broadcast(move |event| match event {
            BroadcastEvent::MovingSection { node: dragged } if *dragged != node => zones.show(),
            BroadcastEvent::MovedSection { .. } => zones.hide(),
            BroadcastEvent::PointerDown { target } => {
                if !target.is_some_and(|target| tree::contains(node, target)) {
                    highlight.deactivate();
                }
            }
            _ => {}
        });

        let cleanups: [Cleanup; 2] = [Box::new(on_event), Box::new(on_window)];
        self.0.listeners.borrow_mut().extend(cleanups);
    }

    fn handle_event(&self, event: &BubbleEvent) -> Propagation {
        let node = self.0.node;
        match event {
            BubbleEvent::AddField { field, id, .. } if tree::parent_of(*field) == Some(node) => {
                let index = tree::child_position(node, *field);
                self.0.fields.update(|fields| {
                    fields.retain(|existing| existing != id);
                    let index = index.unwrap_or(fields.len()).min(fields.len());
                    fields.insert(index, id.clone());
                });
                Propagation::Continue
            }
            BubbleEvent::RemoveField { field, id } if tree::parent_of(*field) == Some(node) => {
                self.0.fields.update(|fields| fields.retain(|existing| existing != id));
                Propagation::Continue
            }
            BubbleEvent::Delete { origin } if *origin == node => {
                for id in self.0.fields.get_untracked() {
                    bubble::dispatch(node, BubbleEvent::DeleteField { id });
                }
                structure::remove_node(node, self.0.animation_ms);
                Propagation::Stop
            }
            BubbleEvent::Copy { origin } if *origin == node => {
                if let Err(err) = structure::duplicate_section(self) {
                    warn!(%node, %err, "copy failed");
                }
                Propagation::Stop
            }
            _ => Propagation::Continue,
        }
    }

    pub(crate) fn disconnect(&self) {
        if !self.is_live() {
            return;
        }
        let section = self.0.node;
        bubble::dispatch(section, BubbleEvent::RemoveSection { section, id: self.id() });
        self.drop_listeners();
        self.0.zones.hide();
        if let Err(err) = self.0.lifecycle.transition(Lifecycle::Detached) {
            warn!(%section, %err, "disconnect from unexpected state");
        }
    }

    fn drop_listeners(&self) {
        let listeners = std::mem::take(&mut *self.0.listeners.borrow_mut());
        for cleanup in listeners {
            cleanup();
        }
    }

    fn teardown(&self) {
        self.drop_listeners();
        self.0.scope.stop();
        let _ = self.0.lifecycle.transition(Lifecycle::Destroyed);
        cancel_animations(self.0.node);
        bubble::clear_node(self.0.node);
        store::remove(self.0.node);
        debug!(node = %self.0.node, "section destroyed");
    }
}
