// crates/kryon-render/src/events.rs
use glam::Vec2;

#[derive(Debug, Clone)]
pub enum InputEvent {
    MouseMove { position: Vec2 },
    MousePress { position: Vec2, button: MouseButton },
    MouseRelease { position: Vec2, button: MouseButton },
    KeyPress { key: KeyCode, modifiers: KeyModifiers },
    KeyRelease { key: KeyCode, modifiers: KeyModifiers },
    Scroll { delta: Vec2 },
    Resize { size: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    Space,
    Backspace,
    Delete,
    Tab,
    Character(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyModifiers {
    pub fn none() -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }
}

/// Per-element pointer interaction state (spec §4.5): Idle -> Hover ->
/// Pressed -> Idle, with `Click` firing only on release while still
/// hovering the same element that was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Hover,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionTransition {
    None,
    EnteredHover,
    Pressed,
    Click,
    Released,
    ExitedHover,
}

impl InteractionState {
    /// Advances the state machine for one element given whether the
    /// pointer is currently over it and whether the primary button is
    /// currently down. Returns the transition that fired, if any.
    pub fn advance(&mut self, hovering: bool, button_down: bool) -> InteractionTransition {
        match (*self, hovering, button_down) {
            (InteractionState::Idle, true, false) => {
                *self = InteractionState::Hover;
                InteractionTransition::EnteredHover
            }
            (InteractionState::Idle, true, true) => {
                *self = InteractionState::Pressed;
                InteractionTransition::Pressed
            }
            (InteractionState::Hover, false, _) => {
                *self = InteractionState::Idle;
                InteractionTransition::ExitedHover
            }
            (InteractionState::Hover, true, true) => {
                *self = InteractionState::Pressed;
                InteractionTransition::Pressed
            }
            (InteractionState::Pressed, true, false) => {
                *self = InteractionState::Hover;
                InteractionTransition::Click
            }
            (InteractionState::Pressed, false, false) => {
                *self = InteractionState::Idle;
                InteractionTransition::Released
            }
            _ => InteractionTransition::None,
        }
    }
}
