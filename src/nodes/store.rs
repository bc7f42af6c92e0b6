//! Node store - maps node indices to their sections and fields.

use std::cell::RefCell;
use std::collections::HashMap;

use super::drop_zone::DropZones;
use super::field::FieldNode;
use super::highlight::Highlight;
use super::section::SectionNode;
use super::view::View;
use crate::engine::Lifecycle;
use crate::error::Result;
use crate::reactive::ReactiveObject;
use crate::types::{NodeId, NodeKind};

/// A section or field.
#[derive(Clone)]
pub enum Node {
    Section(SectionNode),
    Field(FieldNode),
}

impl Node {
    pub fn node_id(&self) -> NodeId {
        match self {
            Node::Section(section) => section.node_id(),
            Node::Field(field) => field.node_id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Section(_) => NodeKind::Section,
            Node::Field(_) => NodeKind::Field,
        }
    }

    pub fn id(&self) -> String {
        match self {
            Node::Section(section) => section.id(),
            Node::Field(field) => field.id(),
        }
    }

    pub fn data(&self) -> &ReactiveObject {
        match self {
            Node::Section(section) => section.data(),
            Node::Field(field) => field.data(),
        }
    }

    pub fn view(&self) -> &View {
        match self {
            Node::Section(section) => section.view(),
            Node::Field(field) => field.view(),
        }
    }

    pub fn highlight(&self) -> &Highlight {
        match self {
            Node::Section(section) => section.highlight(),
            Node::Field(field) => field.highlight(),
        }
    }

    pub fn zones(&self) -> &DropZones {
        match self {
            Node::Section(section) => section.zones(),
            Node::Field(field) => field.zones(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            Node::Section(section) => section.lifecycle(),
            Node::Field(field) => field.lifecycle(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.lifecycle().is_live()
    }

    pub fn send_edit_event(&self) {
        match self {
            Node::Section(section) => section.send_edit_event(),
            Node::Field(field) => field.send_edit_event(),
        }
    }

    pub fn as_field(&self) -> Option<&FieldNode> {
        match self {
            Node::Field(field) => Some(field),
            Node::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionNode> {
        match self {
            Node::Section(section) => Some(section),
            Node::Field(_) => None,
        }
    }

    pub(crate) fn connect(&self) -> Result<()> {
        match self {
            Node::Section(section) => section.connect(),
            Node::Field(field) => field.connect(),
        }
    }

    pub(crate) fn disconnect(&self) {
        match self {
            Node::Section(section) => section.disconnect(),
            Node::Field(field) => field.disconnect(),
        }
    }
}

thread_local! {
    static NODES: RefCell<HashMap<NodeId, Node>> = RefCell::new(HashMap::new());
}

pub(crate) fn insert(node: Node) {
    NODES.with(|nodes| {
        nodes.borrow_mut().insert(node.node_id(), node);
    });
}

pub(crate) fn remove(node: NodeId) -> Option<Node> {
    NODES.with(|nodes| nodes.borrow_mut().remove(&node))
}

pub fn get_node(node: NodeId) -> Option<Node> {
    NODES.with(|nodes| nodes.borrow().get(&node).cloned())
}

pub fn get_field(node: NodeId) -> Option<FieldNode> {
    match get_node(node)? {
        Node::Field(field) => Some(field),
        Node::Section(_) => None,
    }
}

pub fn get_section(node: NodeId) -> Option<SectionNode> {
    match get_node(node)? {
        Node::Section(section) => Some(section),
        Node::Field(_) => None,
    }
}

/// Look a node up by its element id.
pub fn find_by_id(id: &str) -> Option<Node> {
    crate::engine::get_index(id).and_then(get_node)
}

pub fn node_count() -> usize {
    NODES.with(|nodes| nodes.borrow().len())
}

pub fn reset_nodes() {
    let nodes = NODES.with(|nodes| std::mem::take(&mut *nodes.borrow_mut()));
    drop(nodes);
}
