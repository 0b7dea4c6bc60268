use crate::keycodes::{modifier_bit, translate_button, translate_key};
use crate::{InputEventKind, MousePos, Timeline};
use tracing::trace;

/// A translated key-down together with the modifiers held at the time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub code: u32,
    pub modifiers: u32,
}

/// Turns raw hook notifications into timeline entries.
///
/// Modifier tracking runs for every notification so hotkeys can be matched
/// in any session state; timeline writes only happen through [`record`].
///
/// [`record`]: CaptureSink::record
#[derive(Debug, Clone)]
pub struct CaptureSink {
    min_move_distance_sq: i64,
    held_modifiers: Vec<u32>,
}

impl CaptureSink {
    pub fn new(min_move_distance_sq: i64) -> Self {
        Self {
            min_move_distance_sq,
            held_modifiers: Vec::new(),
        }
    }

    /// Current modifier mask
    pub fn modifiers(&self) -> u32 {
        self.held_modifiers
            .iter()
            .fold(0, |mask, code| mask | modifier_bit(*code))
    }

    /// Update modifier state. Key-downs come back as a [`KeyStroke`] for
    /// hotkey matching.
    pub fn observe(&mut self, kind: &InputEventKind) -> Option<KeyStroke> {
        match kind {
            InputEventKind::KeyPressed(key) => {
                let code = translate_key(key);
                if modifier_bit(code) != 0 && !self.held_modifiers.contains(&code) {
                    self.held_modifiers.push(code);
                }
                Some(KeyStroke {
                    code,
                    modifiers: self.modifiers(),
                })
            }
            InputEventKind::KeyReleased(key) => {
                let code = translate_key(key);
                self.held_modifiers.retain(|held| *held != code);
                None
            }
            _ => None,
        }
    }

    /// Append the notification to the timeline at `elapsed` ms.
    /// Returns whether the timeline changed.
    pub fn record(&self, timeline: &mut Timeline, kind: &InputEventKind, elapsed: u64) -> bool {
        match *kind {
            InputEventKind::MouseMoved { x, y } => {
                let far_enough = timeline
                    .last_mouse_pos()
                    .map_or(true, |last| last.dist2(x, y) > self.min_move_distance_sq);
                if far_enough {
                    timeline.push_mouse_pos(MousePos::new(elapsed, x, y));
                }
                far_enough
            }
            InputEventKind::MouseDragged { x, y } => {
                timeline.push_mouse_pos(MousePos::new(elapsed, x, y));
                true
            }
            InputEventKind::KeyPressed(key) => {
                timeline.open_key_press(translate_key(&key), elapsed);
                true
            }
            InputEventKind::KeyReleased(key) => {
                let code = translate_key(&key);
                let closed = timeline.close_key_press(code, elapsed);
                if !closed {
                    trace!(code, elapsed, "Key release without open press dropped");
                }
                closed
            }
            InputEventKind::ButtonPressed(button) => {
                timeline.open_mouse_press(translate_button(&button), elapsed);
                true
            }
            InputEventKind::ButtonReleased(button) => {
                let code = translate_button(&button);
                let closed = timeline.close_mouse_press(code, elapsed);
                if !closed {
                    trace!(code, elapsed, "Button release without open press dropped");
                }
                closed
            }
        }
    }
}
