//! Input state management for pointer and keyboard events.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button; the only one that starts gestures.
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer events, in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        /// Host timestamp in milliseconds, used to pair clicks.
        #[serde(default)]
        time_ms: u64,
    },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
    /// The pointer left the canvas.
    Leave,
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Held to pan.
    Space,
    /// Held to copy piles while dragging.
    Control,
    /// Held to turn arrow nudges into resizes.
    Shift,
    Delete,
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other(String),
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u64 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks held keys and pairs primary clicks across events.
///
/// Click timing comes from the events themselves, so replaying a recorded
/// stream always pairs the same clicks.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Modifier state reported by the host.
    pub modifiers: Modifiers,
    pressed_keys: HashSet<Key>,
    /// Time and position of the press that may open a double-click.
    last_click: Option<(u64, Point)>,
    press_position: Option<Point>,
    double_click_detected: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                time_ms,
            } => {
                self.press_position = Some(position);
                self.double_click_detected = self.last_click.is_some_and(|(time, pressed)| {
                    time_ms >= time
                        && time_ms - time < DOUBLE_CLICK_TIME_MS
                        && position.distance(pressed) < DOUBLE_CLICK_DISTANCE
                });
                // A third press starts a new sequence
                self.last_click = if self.double_click_detected {
                    None
                } else {
                    Some((time_ms, position))
                };
            }
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => {
                // A drag is not a click
                if self
                    .press_position
                    .take()
                    .is_some_and(|pressed| position.distance(pressed) >= DOUBLE_CLICK_DISTANCE)
                {
                    self.reset_click_sequence();
                }
            }
            _ => {}
        }
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        match event {
            KeyEvent::Pressed(key) => {
                self.pressed_keys.insert(key.clone());
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(key);
            }
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_key_pressed(&self, key: &Key) -> bool {
        self.pressed_keys.contains(key)
    }

    /// Whether the fine-control modifier (Shift) is held.
    pub fn shift_held(&self) -> bool {
        self.modifiers.shift || self.is_key_pressed(&Key::Shift)
    }

    /// Whether the current primary press completed a double-click and has
    /// not turned into a drag.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }

    /// Forget any pending click so the next press cannot pair with it.
    pub fn reset_click_sequence(&mut self) {
        self.last_click = None;
        self.double_click_detected = false;
    }
}
