// Input bindings
// Maps keys and mouse buttons to overlay actions

use winit::event::MouseButton;
use winit::keyboard::{Key, KeyCode, ModifiersState, PhysicalKey};

/// Everything the user can ask the overlay to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Close,
    ToggleClickThrough,
    IncreaseOpacity,
    DecreaseOpacity,
    OpenImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// A physical key, with the modifiers that must be held
    Key(KeyCode, ModifiersState),
    /// A letter as the active layout types it, lowercase
    Char(char, ModifiersState),
    Mouse(MouseButton),
}

pub const BINDINGS: &[(Input, Action)] = &[
    (Input::Key(KeyCode::Escape, ModifiersState::empty()), Action::Close),
    (Input::Char('t', ModifiersState::CONTROL), Action::ToggleClickThrough),
    (Input::Key(KeyCode::ArrowUp, ModifiersState::empty()), Action::IncreaseOpacity),
    (Input::Key(KeyCode::ArrowDown, ModifiersState::empty()), Action::DecreaseOpacity),
    (Input::Mouse(MouseButton::Right), Action::OpenImage),
];

/// The single character a key produced, ignoring case
fn typed_char(logical: &Key) -> Option<char> {
    let Key::Character(text) = logical else {
        return None;
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Look up the action for a pressed key; extra held modifiers are ignored.
/// Named keys match by position, letters by what the layout types.
pub fn resolve_key(physical: PhysicalKey, logical: &Key, held: ModifiersState) -> Option<Action> {
    let code = match physical {
        PhysicalKey::Code(code) => Some(code),
        PhysicalKey::Unidentified(_) => None,
    };
    let typed = typed_char(logical);

    BINDINGS.iter().find_map(|(input, action)| {
        let hit = match *input {
            Input::Key(key, required) => code == Some(key) && held.contains(required),
            Input::Char(c, required) => typed == Some(c) && held.contains(required),
            Input::Mouse(_) => false,
        };
        hit.then_some(*action)
    })
}

pub fn resolve_mouse(button: MouseButton) -> Option<Action> {
    BINDINGS.iter().find_map(|(input, action)| match *input {
        Input::Mouse(b) if b == button => Some(*action),
        _ => None,
    })
}
