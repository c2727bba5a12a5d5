//! Winit → [`Input`] translation.

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{ButtonState, Input, Key, MouseButton};

/// Touchpads report scroll in pixels; the camera controller expects lines.
const PIXEL_SCROLL_SCALE: f32 = 0.01;

/// Editor keys by physical code, so WASD stays under the left hand on any
/// layout.
const KEY_TABLE: &[(KeyCode, Key)] = &[
    (KeyCode::KeyA, Key::A),
    (KeyCode::KeyD, Key::D),
    (KeyCode::KeyE, Key::E),
    (KeyCode::KeyF, Key::F),
    (KeyCode::KeyQ, Key::Q),
    (KeyCode::KeyR, Key::R),
    (KeyCode::KeyS, Key::S),
    (KeyCode::KeyT, Key::T),
    (KeyCode::KeyW, Key::W),
    (KeyCode::Space, Key::Space),
    (KeyCode::Enter, Key::Enter),
    (KeyCode::Escape, Key::Escape),
    (KeyCode::Delete, Key::Delete),
    (KeyCode::ShiftLeft, Key::ShiftLeft),
    (KeyCode::ShiftRight, Key::ShiftRight),
    (KeyCode::ControlLeft, Key::ControlLeft),
    (KeyCode::ControlRight, Key::ControlRight),
    (KeyCode::ArrowUp, Key::ArrowUp),
    (KeyCode::ArrowDown, Key::ArrowDown),
    (KeyCode::ArrowLeft, Key::ArrowLeft),
    (KeyCode::ArrowRight, Key::ArrowRight),
];

#[must_use]
pub fn translate_key(physical_key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = physical_key else {
        return None;
    };
    KEY_TABLE
        .iter()
        .find_map(|&(candidate, key)| (candidate == code).then_some(key))
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        use winit::event::MouseButton as W;
        match button {
            W::Left => Self::Left,
            W::Right => Self::Right,
            W::Middle => Self::Middle,
            W::Back => Self::Other(3),
            W::Forward => Self::Other(4),
            W::Other(id) => Self::Other(id),
        }
    }
}

impl From<ElementState> for ButtonState {
    fn from(state: ElementState) -> Self {
        if state.is_pressed() {
            Self::Pressed
        } else {
            Self::Released
        }
    }
}

/// Feeds the input-relevant part of `event` into `input`. Everything else is
/// left to the runner.
pub fn process_window_event(input: &mut Input, event: &WindowEvent) {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            if let Some(key) = translate_key(event.physical_key) {
                input.inject_key(key, event.state.into());
            }
        }
        WindowEvent::CursorMoved { position, .. } => {
            input.inject_mouse_position(position.x as f32, position.y as f32);
        }
        WindowEvent::MouseInput { state, button, .. } => {
            input.inject_mouse_button((*button).into(), (*state).into());
        }
        WindowEvent::MouseWheel { delta, .. } => match *delta {
            MouseScrollDelta::LineDelta(x, y) => input.inject_scroll(x, y),
            MouseScrollDelta::PixelDelta(p) => input.inject_scroll(
                p.x as f32 * PIXEL_SCROLL_SCALE,
                p.y as f32 * PIXEL_SCROLL_SCALE,
            ),
        },
        WindowEvent::Resized(size) => input.inject_resize(size.width, size.height),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_keys_are_translated() {
        assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyW)), Some(Key::W));
        assert_eq!(
            translate_key(PhysicalKey::Code(KeyCode::ShiftLeft)),
            Some(Key::ShiftLeft)
        );
        assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyZ)), None);
    }

    #[test]
    fn extra_mouse_buttons_map_to_other() {
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Back),
            MouseButton::Other(3)
        );
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Left),
            MouseButton::Left
        );
    }

    #[test]
    fn element_state_converts() {
        assert_eq!(ButtonState::from(ElementState::Pressed), ButtonState::Pressed);
        assert_eq!(ButtonState::from(ElementState::Released), ButtonState::Released);
    }
}
