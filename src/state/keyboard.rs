//! Keyboard event types.
//!
//! The designer does not own the keyboard. Hosts translate their native key
//! events into [`KeyboardEvent`] and hand them to the widget that has focus
//! (the calendar's grid and time inputs, for example).

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const ALT = 1 << 1;
        const SHIFT = 1 << 2;
        const META = 1 << 3;
    }
}

pub const UP_KEYS: &[&str] = &["ArrowUp", "Up"];
pub const DOWN_KEYS: &[&str] = &["ArrowDown", "Down"];
pub const LEFT_KEYS: &[&str] = &["ArrowLeft", "Left"];
pub const RIGHT_KEYS: &[&str] = &["ArrowRight", "Right"];

/// Direction of an arrow key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardEvent {
    /// The key that was pressed (e.g., "a", "Enter", "ArrowUp")
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    pub fn is(&self, key: &str) -> bool {
        self.key == key
    }

    pub fn arrow(&self) -> Option<Arrow> {
        let key = self.key.as_str();
        if UP_KEYS.contains(&key) {
            Some(Arrow::Up)
        } else if DOWN_KEYS.contains(&key) {
            Some(Arrow::Down)
        } else if LEFT_KEYS.contains(&key) {
            Some(Arrow::Left)
        } else if RIGHT_KEYS.contains(&key) {
            Some(Arrow::Right)
        } else {
            None
        }
    }

    /// Single visible character with no command modifier held.
    pub fn is_printable(&self) -> bool {
        let mut chars = self.key.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_control())
            && !self.modifiers.intersects(Modifiers::CTRL | Modifiers::META | Modifiers::ALT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_aliases() {
        assert_eq!(KeyboardEvent::new("ArrowUp").arrow(), Some(Arrow::Up));
        assert_eq!(KeyboardEvent::new("Left").arrow(), Some(Arrow::Left));
        assert_eq!(KeyboardEvent::new("Enter").arrow(), None);
    }

    #[test]
    fn test_printable_ignores_commands() {
        assert!(KeyboardEvent::new("7").is_printable());
        assert!(KeyboardEvent::with_modifiers("A", Modifiers::SHIFT).is_printable());
        assert!(!KeyboardEvent::with_modifiers("c", Modifiers::CTRL).is_printable());
        assert!(!KeyboardEvent::new("Tab").is_printable());
    }
}
