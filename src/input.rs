use std::collections::HashSet;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::camera_controller::Movement;

/// What a single key event asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    ToggleSpotlight,
    ToggleEffect,
    None,
}

pub fn movement_for(key: KeyCode) -> Option<Movement> {
    match key {
        KeyCode::KeyW => Some(Movement::Forward),
        KeyCode::KeyS => Some(Movement::Backward),
        KeyCode::KeyA => Some(Movement::Left),
        KeyCode::KeyD => Some(Movement::Right),
        _ => None,
    }
}

/// Keyboard state between frames. Movement keys are held, the rest fire once
/// per physical press.
#[derive(Debug, Default)]
pub struct KeyboardState {
    held: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) -> KeyAction {
        match state {
            ElementState::Pressed => {
                self.held.insert(key);
                if repeat {
                    return KeyAction::None;
                }
                match key {
                    KeyCode::Escape => KeyAction::Exit,
                    KeyCode::KeyL => KeyAction::ToggleSpotlight,
                    KeyCode::KeyG => KeyAction::ToggleEffect,
                    _ => KeyAction::None,
                }
            }
            ElementState::Released => {
                self.held.remove(&key);
                KeyAction::None
            }
        }
    }

    /// Movements for every movement key currently held down.
    pub fn movements(&self) -> impl Iterator<Item = Movement> + '_ {
        self.held.iter().filter_map(|&key| movement_for(key))
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_fire_once_per_press() {
        let mut keys = KeyboardState::default();
        assert_eq!(
            keys.handle_key(KeyCode::KeyL, ElementState::Pressed, false),
            KeyAction::ToggleSpotlight
        );
        assert_eq!(
            keys.handle_key(KeyCode::KeyL, ElementState::Pressed, true),
            KeyAction::None
        );
        assert_eq!(
            keys.handle_key(KeyCode::KeyL, ElementState::Released, false),
            KeyAction::None
        );
        assert_eq!(
            keys.handle_key(KeyCode::KeyG, ElementState::Pressed, false),
            KeyAction::ToggleEffect
        );
        assert_eq!(
            keys.handle_key(KeyCode::Escape, ElementState::Pressed, false),
            KeyAction::Exit
        );
    }

    #[test]
    fn movement_keys_are_held_until_released() {
        let mut keys = KeyboardState::default();
        keys.handle_key(KeyCode::KeyW, ElementState::Pressed, false);
        keys.handle_key(KeyCode::KeyD, ElementState::Pressed, false);
        keys.handle_key(KeyCode::KeyQ, ElementState::Pressed, false);
        let mut held: Vec<_> = keys.movements().map(|m| format!("{m:?}")).collect();
        held.sort();
        assert_eq!(held, vec!["Forward", "Right"]);

        keys.handle_key(KeyCode::KeyW, ElementState::Released, false);
        assert_eq!(keys.movements().collect::<Vec<_>>(), vec![Movement::Right]);
        keys.clear();
        assert_eq!(keys.movements().count(), 0);
    }
}
