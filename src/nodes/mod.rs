//! Document nodes - the canvas, its sections and their fields.
//!
//! - [`Canvas`] - document root, form-level registries and edit target
//! - [`SectionNode`] - ordered container of fields
//! - [`FieldNode`] - one form field; type-specific behaviour via [`FieldView`]
//! - [`structure`] - attach, move, remove and duplicate
//! - [`registry`] - tag → field view constructors
//!
//! Every node owns a headless [`View`] that its effects paint, a
//! [`Highlight`] and a pair of [`DropZones`].

mod canvas;
mod drop_zone;
mod field;
mod highlight;
pub mod registry;
mod section;
mod store;
pub mod structure;
mod view;

pub use canvas::{canvas_of, Canvas};
pub use drop_zone::{DropZone, DropZones};
pub use field::{FieldContext, FieldNode, FieldView};
pub use highlight::Highlight;
pub use registry::{instantiate, is_registered, register_field_type, registered_tags, FieldFactory};
pub use section::SectionNode;
pub use store::{find_by_id, get_field, get_node, get_section, node_count, reset_nodes, Node};
pub use view::{slots, View};

pub(crate) use canvas::reset_canvases;
pub(crate) use field::paint_input;
