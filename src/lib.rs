//! # form-designer
//!
//! Reactive core of a visual form designer.
//!
//! A palette of field types is dragged onto a canvas organised in sections.
//! Every section and field owns a reactive record of attributes; effects
//! paint those attributes into a headless [`View`] and re-run, synchronously,
//! whenever an attribute they read is written.
//!
//! ## Architecture
//!
//! ```text
//! drag gesture → state::drag broadcasts → nodes show drop zones
//!     → drop resolves a placement → nodes::structure attaches or moves
//!     → node connect: initialize() once, setup() every time
//!     → effects paint the View → attribute writes re-run subscribed effects
//! ```
//!
//! ## Modules
//!
//! - [`reactive`] - signals, reactive records, effects, memos, scopes
//! - [`engine`] - node indices, element ids, document tree, lifecycle
//! - [`events`] - bubbling node events, broadcasts, microtasks
//! - [`nodes`] - canvas, sections, fields and structural edits
//! - [`fields`] - built-in field types
//! - [`widgets`] - calendar and map singletons
//! - [`state`] - drag and drop, pointer, keyboard, animations
//! - [`palette`] - draggable field types
//!
//! ## Example
//!
//! ```ignore
//! use form_designer::*;
//!
//! register_builtin_fields();
//! let canvas = Canvas::new(DesignerConfig::default())?;
//! let section = canvas.add_section()?;
//!
//! start_palette_drag("text")?;
//! let field = drop_payload(&canvas, DropTarget::Container(section.node_id()))?;
//! end_drag();
//!
//! get_field(field).unwrap().data().write(keys::LABEL, "First name".to_string());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fields;
pub mod nodes;
pub mod palette;
pub mod reactive;
pub mod state;
pub mod types;
pub mod widgets;

pub use types::*;

pub use config::{DesignerConfig, FieldLayout};
pub use error::{FormError, Result};

pub use reactive::{
    create_effect, create_memo, effect_scope, keys, on_cleanup, on_scope_dispose, untrack, Effect, EffectScope,
    Key, Memo, Reactive, ReactiveObject, Value,
};

pub use engine::{generate_id, get_id, get_index, Lifecycle};

pub use events::{flush_microtasks, BroadcastEvent, BubbleEvent, Propagation};

pub use nodes::{
    canvas_of, find_by_id, get_field, get_node, get_section, register_field_type, slots, Canvas, FieldContext,
    FieldNode, FieldView, Node, SectionNode, View,
};

pub use fields::register_builtin_fields;

pub use widgets::{install_calendar, install_map, uninstall_calendar, uninstall_map, Calendar, LatLng, MapWidget};

pub use state::{
    advance_animations, begin_drag, drag_leave, drag_over, drag_state, drop_payload, end_drag, finish_animations,
    pointer_down, pointer_move, DragPayload, DragState, DropTarget, KeyboardEvent, Modifiers, WheelEvent,
};

pub use palette::{palette_entries, start_palette_drag, PaletteEntry};

/// Drop every designer node, listener, animation and registration on this
/// thread. Field types and host widgets are removed too.
pub fn reset_designer() {
    widgets::uninstall_calendar();
    widgets::uninstall_map();
    nodes::reset_canvases();
    engine::reset_registry();
    nodes::reset_nodes();
    nodes::registry::reset_field_types();
    events::bubble::reset_bubble_handlers();
    events::broadcast::reset_broadcast();
    events::reset_microtasks();
    state::reset_animations();
    state::reset_drag();
    state::reset_pointer();
}
