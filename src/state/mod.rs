//! State Module - Runtime interaction state
//!
//! - **Animate** - enter/exit transitions, advanced by the host clock
//! - **Drag** - palette and node drags, drop-zone negotiation
//! - **Keyboard** - event types and modifier flags
//! - **Pointer** - hover tracking, presses, wheel events

pub mod animate;
pub mod drag;
pub mod keyboard;
pub mod pointer;

pub use animate::{
    active_animations, advance_animations, animate_enter, animate_exit, animation_kind, finish_animations,
    is_animating, reset_animations, AnimationKind,
};
pub use drag::{
    begin_drag, drag_leave, drag_over, drag_state, drop_payload, end_drag, is_dragging, reset_drag, DragPayload,
    DragState, DropTarget,
};
pub use keyboard::{Arrow, KeyboardEvent, Modifiers};
pub use pointer::{hovered, pointer_down, pointer_leave, pointer_move, reset_pointer, WheelEvent};
