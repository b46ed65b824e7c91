//! Keyboard input state for the platformer controls.
//!
//! Tracks held keys plus per-frame press/release edges. Edge queries are true
//! for exactly one frame per physical press.

use std::collections::HashSet;

/// Key bindings for the platformer actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub jump: KeyCode,
    pub dash: KeyCode,
    pub shift: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
            right: vec![KeyCode::KeyD, KeyCode::ArrowRight],
            jump: KeyCode::Space,
            dash: KeyCode::ShiftRight,
            shift: KeyCode::ShiftLeft,
        }
    }
}

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,

    bindings: KeyBindings,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Raw horizontal axis in `{-1, 0, 1}`. Opposing keys cancel.
    pub fn horizontal_axis(&self) -> f32 {
        let mut axis = 0.0;
        if self.bindings.left.iter().any(|k| self.is_key_held(*k)) {
            axis -= 1.0;
        }
        if self.bindings.right.iter().any(|k| self.is_key_held(*k)) {
            axis += 1.0;
        }
        axis
    }

    /// Check if jump was pressed (Space).
    pub fn is_jump_pressed(&self) -> bool {
        self.is_key_pressed(self.bindings.jump)
    }

    /// Check if dash was pressed (Right Shift).
    pub fn is_dash_pressed(&self) -> bool {
        self.is_key_pressed(self.bindings.dash)
    }

    /// Check if the world shift was pressed (Left Shift).
    pub fn is_shift_pressed(&self) -> bool {
        self.is_key_pressed(self.bindings.shift)
    }
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;
