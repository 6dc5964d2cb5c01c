use navigation::{InputEvent, Key as NavKey, PointerButton};
use raw_window_handle::HasWindowHandle;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoopWindowTarget;
use winit::keyboard::{Key, NamedKey};
use winit::platform::x11::WindowBuilderExtX11;
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use crate::error::EngineError;

/// Pixel scroll deltas are folded into wheel lines at this rate.
const PIXELS_PER_LINE: f64 = 40.0;

/// The session overlay as seen by the frame loop setup.
pub(crate) trait Overlay: HasWindowHandle {
    /// Maps the window and takes the pointer and keyboard.
    fn reveal(&self);
}

impl Overlay for Window {
    fn reveal(&self) {
        self.set_visible(true);
        if let Err(err) = self.set_cursor_grab(CursorGrabMode::Confined) {
            tracing::warn!(error = %err, "could not confine pointer to the overlay");
        }
        self.focus_window();
    }
}

/// Creates the overlay over the top-left `size` pixels of the screen,
/// bypassing the window manager so it appears above everything else.
///
/// The window starts unmapped; [`Overlay::reveal`] shows it.
pub(crate) fn create_overlay(
    target: &EventLoopWindowTarget<()>,
    size: (u32, u32),
) -> Result<Window, EngineError> {
    WindowBuilder::new()
        .with_title("loupe")
        .with_visible(false)
        .with_decorations(false)
        .with_resizable(false)
        .with_position(PhysicalPosition::new(0, 0))
        .with_inner_size(PhysicalSize::new(size.0, size.1))
        .with_override_redirect(true)
        .build(target)
        .map_err(|err| EngineError::Window(format!("failed to create overlay window: {err}")))
}

/// Converts one overlay window event into an engine input event.
///
/// `cursor` carries the last known pointer position between calls because
/// button events do not report one. Anything without an engine meaning
/// (focus, redraw, key repeats, ...) yields `None`.
pub fn translate_event(event: &WindowEvent, cursor: &mut [f32; 2]) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            *cursor = [position.x as f32, position.y as f32];
            Some(InputEvent::Motion {
                x: cursor[0],
                y: cursor[1],
            })
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_button(*button);
            let [x, y] = *cursor;
            Some(match state {
                ElementState::Pressed => InputEvent::ButtonDown { button, x, y },
                ElementState::Released => InputEvent::ButtonUp { button, x, y },
            })
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = scroll_lines(*delta);
            (lines != 0.0).then_some(InputEvent::Scroll { lines })
        }
        WindowEvent::KeyboardInput { event, .. } => {
            if event.repeat {
                return None;
            }
            let key = map_key(&event.logical_key)?;
            Some(match event.state {
                ElementState::Pressed => InputEvent::KeyDown { key },
                ElementState::Released => InputEvent::KeyUp { key },
            })
        }
        _ => None,
    }
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Right,
        MouseButton::Back => PointerButton::Other(8),
        MouseButton::Forward => PointerButton::Other(9),
        MouseButton::Other(code) => PointerButton::Other(code),
    }
}

fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
    }
}

fn map_key(key: &Key) -> Option<NavKey> {
    match key {
        Key::Named(NamedKey::Escape) => Some(NavKey::Escape),
        Key::Named(NamedKey::ArrowLeft) => Some(NavKey::Left),
        Key::Named(NamedKey::ArrowRight) => Some(NavKey::Right),
        Key::Named(NamedKey::ArrowUp) => Some(NavKey::Up),
        Key::Named(NamedKey::ArrowDown) => Some(NavKey::Down),
        Key::Character(value) => {
            let mut chars = value.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(NavKey::Char(ch.to_ascii_lowercase()))
        }
        _ => Some(NavKey::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::{DeviceId, TouchPhase};

    fn device() -> DeviceId {
        // SAFETY: the dummy id is only compared, never passed to the platform.
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn buttons_use_last_cursor_position() {
        let mut cursor = [0.0, 0.0];
        let moved = WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(120.0, 48.0),
        };
        assert_eq!(
            translate_event(&moved, &mut cursor),
            Some(InputEvent::Motion { x: 120.0, y: 48.0 })
        );

        let pressed = WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Middle,
        };
        assert_eq!(
            translate_event(&pressed, &mut cursor),
            Some(InputEvent::ButtonDown {
                button: PointerButton::Middle,
                x: 120.0,
                y: 48.0
            })
        );
    }

    #[test]
    fn wheel_up_is_positive_lines() {
        let mut cursor = [0.0, 0.0];
        let wheel = WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: TouchPhase::Moved,
        };
        assert_eq!(
            translate_event(&wheel, &mut cursor),
            Some(InputEvent::Scroll { lines: 1.0 })
        );
    }

    #[test]
    fn pixel_scroll_folds_into_lines() {
        let lines = scroll_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -20.0)));
        assert!((lines + 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn horizontal_only_wheel_is_ignored() {
        let mut cursor = [0.0, 0.0];
        let wheel = WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(3.0, 0.0),
            phase: TouchPhase::Moved,
        };
        assert_eq!(translate_event(&wheel, &mut cursor), None);
    }

    #[test]
    fn keys_map_to_engine_symbols() {
        assert_eq!(map_key(&Key::Named(NamedKey::Escape)), Some(NavKey::Escape));
        assert_eq!(map_key(&Key::Named(NamedKey::ArrowUp)), Some(NavKey::Up));
        assert_eq!(map_key(&Key::Character("W".into())), Some(NavKey::Char('w')));
        assert_eq!(map_key(&Key::Character("ab".into())), None);
        assert_eq!(map_key(&Key::Named(NamedKey::Shift)), Some(NavKey::Other));
    }

    #[test]
    fn focus_changes_are_not_input() {
        let mut cursor = [5.0, 5.0];
        assert_eq!(translate_event(&WindowEvent::Focused(true), &mut cursor), None);
        assert_eq!(cursor, [5.0, 5.0]);
    }
}
