//! Keyboard handling.
//!
//! Toggles act once per released -> pressed transition. Holding a key, or
//! the OS repeating it, never flips a toggle twice.

use winit::keyboard::KeyCode;

/// Boolean flipped on the rising edge of a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeToggle {
    value: bool,
    held: bool,
}

impl EdgeToggle {
    /// Toggle starting at `value`, key released.
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self { value, held: false }
    }

    /// Feeds the current key state. Returns `true` if the value flipped.
    pub fn update(&mut self, pressed: bool) -> bool {
        let rising = pressed && !self.held;
        self.held = pressed;
        if rising {
            self.value = !self.value;
        }
        rising
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> bool {
        self.value
    }
}

/// What a key event asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Culling switched to the carried state.
    SetCulling(bool),
    /// Orbit paused (`true`) or resumed.
    SetPaused(bool),
    /// Leave the event loop.
    Exit,
}

/// Viewer key bindings: `C` culling, `Space` pause, `Escape` exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerInput {
    culling: EdgeToggle,
    pause: EdgeToggle,
}

impl ViewerInput {
    /// Bindings with culling starting at `culling_enabled`.
    #[must_use]
    pub const fn new(culling_enabled: bool) -> Self {
        Self {
            culling: EdgeToggle::new(culling_enabled),
            pause: EdgeToggle::new(false),
        }
    }

    /// Feeds one key event.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> Option<InputAction> {
        match key {
            KeyCode::KeyC => self
                .culling
                .update(pressed)
                .then(|| InputAction::SetCulling(self.culling.value())),
            KeyCode::Space => self
                .pause
                .update(pressed)
                .then(|| InputAction::SetPaused(self.pause.value())),
            KeyCode::Escape if pressed => Some(InputAction::Exit),
            _ => None,
        }
    }

    /// Current culling toggle.
    #[must_use]
    pub const fn culling(&self) -> bool {
        self.culling.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flips_once_per_press() {
        let mut toggle = EdgeToggle::new(true);
        assert!(toggle.update(true));
        assert!(!toggle.value());
        for _ in 0..30 {
            assert!(!toggle.update(true));
        }
        assert!(!toggle.value());
        assert!(!toggle.update(false));
        assert!(toggle.update(true));
        assert!(toggle.value());
    }

    #[test]
    fn test_escape_on_press_only() {
        let mut input = ViewerInput::new(true);
        assert_eq!(input.handle_key(KeyCode::Escape, false), None);
        assert_eq!(input.handle_key(KeyCode::Escape, true), Some(InputAction::Exit));
    }
}
