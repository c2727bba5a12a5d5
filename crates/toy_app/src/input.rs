//! Platform-agnostic input state.
//!
//! Window backends translate their events into the `inject_*` calls; the
//! frame loop and the editor read the query side. Edge state (went down or
//! up this frame) and the pointer/scroll deltas are reset by
//! [`Input::start_frame`].

use std::hash::Hash;

use glam::Vec2;
use rustc_hash::FxHashSet;

/// Keys the editor reacts to. Backends drop everything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    D,
    E,
    F,
    Q,
    R,
    S,
    T,
    W,
    Space,
    Enter,
    Escape,
    Delete,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Held set plus the edges recorded since the last frame boundary.
#[derive(Debug, Clone)]
struct Buttons<T> {
    held: FxHashSet<T>,
    went_down: FxHashSet<T>,
    went_up: FxHashSet<T>,
}

impl<T> Default for Buttons<T> {
    fn default() -> Self {
        Self {
            held: FxHashSet::default(),
            went_down: FxHashSet::default(),
            went_up: FxHashSet::default(),
        }
    }
}

impl<T: Copy + Eq + Hash> Buttons<T> {
    /// OS key repeat re-sends `Pressed`; only the first one is an edge.
    fn apply(&mut self, button: T, state: ButtonState) {
        let changed = match state {
            ButtonState::Pressed => self.held.insert(button),
            ButtonState::Released => self.held.remove(&button),
        };
        if changed {
            match state {
                ButtonState::Pressed => self.went_down.insert(button),
                ButtonState::Released => self.went_up.insert(button),
            };
        }
    }

    fn clear_edges(&mut self) {
        self.went_down.clear();
        self.went_up.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Input {
    keys: Buttons<Key>,
    mouse: Buttons<MouseButton>,
    cursor: Option<Vec2>,
    cursor_delta: Vec2,
    scroll: Vec2,
    window_size: Vec2,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_frame(&mut self) {
        self.keys.clear_edges();
        self.mouse.clear_edges();
        self.cursor_delta = Vec2::ZERO;
        self.scroll = Vec2::ZERO;
    }

    pub fn inject_key(&mut self, key: Key, state: ButtonState) {
        self.keys.apply(key, state);
    }

    pub fn inject_mouse_button(&mut self, button: MouseButton, state: ButtonState) {
        self.mouse.apply(button, state);
    }

    /// The first position only seeds the cursor; deltas start with the second.
    pub fn inject_mouse_position(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if let Some(previous) = self.cursor.replace(position) {
            self.cursor_delta += position - previous;
        }
    }

    pub fn inject_scroll(&mut self, delta_x: f32, delta_y: f32) {
        self.scroll += Vec2::new(delta_x, delta_y);
    }

    pub fn inject_resize(&mut self, width: u32, height: u32) {
        self.window_size = Vec2::new(width as f32, height as f32);
    }

    #[must_use]
    pub fn get_key(&self, key: Key) -> bool {
        self.keys.held.contains(&key)
    }

    #[must_use]
    pub fn get_key_down(&self, key: Key) -> bool {
        self.keys.went_down.contains(&key)
    }

    #[must_use]
    pub fn get_key_up(&self, key: Key) -> bool {
        self.keys.went_up.contains(&key)
    }

    #[must_use]
    pub fn get_mouse_button(&self, button: MouseButton) -> bool {
        self.mouse.held.contains(&button)
    }

    #[must_use]
    pub fn get_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse.went_down.contains(&button)
    }

    #[must_use]
    pub fn get_mouse_button_up(&self, button: MouseButton) -> bool {
        self.mouse.went_up.contains(&button)
    }

    /// Cursor position in window pixels, origin top-left. `ZERO` until the
    /// first cursor event.
    #[must_use]
    pub fn mouse_position(&self) -> Vec2 {
        self.cursor.unwrap_or(Vec2::ZERO)
    }

    #[must_use]
    pub fn mouse_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    #[must_use]
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll
    }

    #[must_use]
    pub fn screen_size(&self) -> Vec2 {
        self.window_size
    }

    /// Either shift key.
    #[must_use]
    pub fn shift(&self) -> bool {
        self.get_key(Key::ShiftLeft) || self.get_key(Key::ShiftRight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edge_lasts_one_frame() {
        let mut input = Input::new();
        input.inject_key(Key::W, ButtonState::Pressed);
        assert!(input.get_key_down(Key::W));
        input.start_frame();
        assert!(!input.get_key_down(Key::W));
        assert!(input.get_key(Key::W));
    }

    #[test]
    fn repeated_press_is_not_a_new_edge() {
        let mut input = Input::new();
        input.inject_mouse_button(MouseButton::Left, ButtonState::Pressed);
        input.start_frame();
        input.inject_mouse_button(MouseButton::Left, ButtonState::Pressed);
        assert!(!input.get_mouse_button_down(MouseButton::Left));
        input.inject_mouse_button(MouseButton::Left, ButtonState::Released);
        assert!(input.get_mouse_button_up(MouseButton::Left));
        assert!(!input.get_mouse_button(MouseButton::Left));
    }

    #[test]
    fn first_cursor_event_produces_no_delta() {
        let mut input = Input::new();
        input.inject_mouse_position(0.0, 0.0);
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        input.inject_mouse_position(3.0, 4.0);
        assert_eq!(input.mouse_delta(), Vec2::new(3.0, 4.0));
    }
}
