//! Platform-agnostic input handling system

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events, carrying a physical key code ("KeyW", "ArrowUp", ...)
    KeyDown(String),
    KeyUp(String),

    // Pointer movement while captured
    MouseMove { dx: f32, dy: f32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub release_pointer: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let codes = |list: &[&str]| list.iter().map(|c| c.to_string()).collect();
        Self {
            forward: codes(&["ArrowUp", "KeyW"]),
            backward: codes(&["ArrowDown", "KeyS"]),
            left: codes(&["ArrowLeft", "KeyA"]),
            right: codes(&["ArrowRight", "KeyD"]),
            release_pointer: "Escape".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn direction_for(&self, code: &str) -> Option<MoveDirection> {
        let bound = |list: &[String]| list.iter().any(|c| c == code);
        if bound(&self.forward) {
            Some(MoveDirection::Forward)
        } else if bound(&self.backward) {
            Some(MoveDirection::Backward)
        } else if bound(&self.left) {
            Some(MoveDirection::Left)
        } else if bound(&self.right) {
            Some(MoveDirection::Right)
        } else {
            None
        }
    }

    pub fn is_release(&self, code: &str) -> bool {
        code == self.release_pointer
    }
}

/// The four held movement keys
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    bindings: KeyBindings,
}

impl InputState {
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::default())
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            bindings,
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Returns whether the code is a movement key
    pub fn on_key_down(&mut self, code: &str) -> bool {
        self.set_key(code, true)
    }

    pub fn on_key_up(&mut self, code: &str) -> bool {
        self.set_key(code, false)
    }

    fn set_key(&mut self, code: &str, held: bool) -> bool {
        let Some(direction) = self.bindings.direction_for(code) else {
            return false;
        };
        match direction {
            MoveDirection::Forward => self.forward = held,
            MoveDirection::Backward => self.backward = held,
            MoveDirection::Left => self.left = held,
            MoveDirection::Right => self.right = held,
        }
        true
    }

    pub fn is_held(&self, direction: MoveDirection) -> bool {
        match direction {
            MoveDirection::Forward => self.forward,
            MoveDirection::Backward => self.backward,
            MoveDirection::Left => self.left,
            MoveDirection::Right => self.right,
        }
    }

    pub fn any_longitudinal(&self) -> bool {
        self.forward || self.backward
    }

    pub fn any_lateral(&self) -> bool {
        self.left || self.right
    }

    pub fn clear_keys(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let code = e.code();
        if is_down {
            InputEvent::KeyDown(code)
        } else {
            InputEvent::KeyUp(code)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_and_arrows_alias() {
        let mut input = InputState::new();
        for (code, dir) in [
            ("KeyW", MoveDirection::Forward),
            ("ArrowUp", MoveDirection::Forward),
            ("KeyS", MoveDirection::Backward),
            ("ArrowDown", MoveDirection::Backward),
            ("KeyA", MoveDirection::Left),
            ("ArrowLeft", MoveDirection::Left),
            ("KeyD", MoveDirection::Right),
            ("ArrowRight", MoveDirection::Right),
        ] {
            assert!(input.on_key_down(code));
            assert!(input.is_held(dir), "{code} should hold {dir:?}");
            assert!(input.on_key_up(code));
            assert!(!input.is_held(dir), "{code} should release {dir:?}");
        }
    }

    #[test]
    fn test_key_touches_one_flag() {
        let mut input = InputState::new();
        input.on_key_down("KeyA");
        assert!(input.left);
        assert!(!input.forward && !input.backward && !input.right);
        assert!(input.any_lateral());
        assert!(!input.any_longitudinal());
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let mut input = InputState::new();
        assert!(!input.on_key_down("KeyQ"));
        assert!(!input.on_key_down("Space"));
        // key codes, not characters
        assert!(!input.on_key_down("w"));
        assert!(!input.any_longitudinal() && !input.any_lateral());
    }

    #[test]
    fn test_clear_keys() {
        let mut input = InputState::new();
        input.on_key_down("KeyW");
        input.on_key_down("KeyD");
        input.clear_keys();
        assert!(!input.forward && !input.right);
    }

    #[test]
    fn test_release_binding() {
        let bindings = KeyBindings::default();
        assert!(bindings.is_release("Escape"));
        assert!(!bindings.is_release("KeyW"));
    }
}
