// =============================================================================
// KEYMAP.RS — keyboard keys to console buttons
// =============================================================================

use std::collections::HashMap;

use winit::keyboard::KeyCode;

use crate::engine::Button;

#[derive(Clone, Debug)]
pub struct KeyMap {
    bindings: HashMap<KeyCode, Button>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self { bindings: HashMap::new() };
        for (key, button) in [
            (KeyCode::ArrowLeft, Button::DPAD_LEFT),
            (KeyCode::ArrowRight, Button::DPAD_RIGHT),
            (KeyCode::ArrowUp, Button::DPAD_UP),
            (KeyCode::ArrowDown, Button::DPAD_DOWN),
            (KeyCode::KeyA, Button::DPAD_LEFT),
            (KeyCode::KeyD, Button::DPAD_RIGHT),
            (KeyCode::KeyW, Button::DPAD_UP),
            (KeyCode::KeyS, Button::DPAD_DOWN),
            (KeyCode::KeyZ, Button::A),
            (KeyCode::KeyX, Button::B),
            (KeyCode::KeyC, Button::X),
            (KeyCode::KeyV, Button::Y),
            (KeyCode::KeyU, Button::A),
            (KeyCode::KeyI, Button::B),
            (KeyCode::KeyO, Button::X),
            (KeyCode::KeyP, Button::Y),
            (KeyCode::Digit1, Button::HOME),
            (KeyCode::Digit2, Button::MENU),
            (KeyCode::Digit3, Button::JOYSTICK),
            (KeyCode::Escape, Button::MENU),
        ] {
            map.bind(key, button);
        }
        map
    }
}

impl KeyMap {
    pub fn empty() -> Self {
        Self { bindings: HashMap::new() }
    }

    /// Bind `key` to `button`, replacing any previous binding for that key.
    pub fn bind(&mut self, key: KeyCode, button: Button) {
        self.bindings.insert(key, button);
    }

    pub fn unbind(&mut self, key: KeyCode) {
        self.bindings.remove(&key);
    }

    pub fn button_for(&self, key: KeyCode) -> Option<Button> {
        self.bindings.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let map = KeyMap::default();
        assert_eq!(map.button_for(KeyCode::KeyW), Some(Button::DPAD_UP));
        assert_eq!(map.button_for(KeyCode::KeyP), Some(Button::Y));
        assert_eq!(map.button_for(KeyCode::Escape), Some(Button::MENU));
        assert_eq!(map.button_for(KeyCode::F1), None);
    }

    #[test]
    fn rebind_replaces() {
        let mut map = KeyMap::default();
        map.bind(KeyCode::KeyZ, Button::B);
        assert_eq!(map.button_for(KeyCode::KeyZ), Some(Button::B));
        map.unbind(KeyCode::KeyZ);
        assert_eq!(map.button_for(KeyCode::KeyZ), None);
    }
}
