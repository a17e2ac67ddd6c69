//! Platform-agnostic pointer and keyboard events
//!
//! Front ends translate their native events into these before handing
//! them to the surface or the `App`.

use crate::model::Point;

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        alt: false,
        ctrl: false,
    };
    pub const ALT: Modifiers = Modifiers {
        shift: false,
        alt: true,
        ctrl: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
}

/// Press state shared by pointer and key events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Surface-relative position in image pixels
    pub position: Point,
    pub button: Button,
    pub phase: Phase,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, button: Button, phase: Phase) -> Self {
        Self {
            position: Point::new(x, y),
            button,
            phase,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn down(x: f64, y: f64) -> Self {
        Self::new(x, y, Button::Primary, Phase::Down)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(x, y, Button::Primary, Phase::Move)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(x, y, Button::Primary, Phase::Up)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Key identifier, reduced to what the annotation protocol distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    F(u8),
    Other,
}

impl Key {
    pub fn is_delete(self) -> bool {
        matches!(self, Key::Backspace | Key::Delete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Only `Down` and `Up` are meaningful for keys
    pub phase: Phase,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            phase: Phase::Down,
        }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            phase: Phase::Up,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
