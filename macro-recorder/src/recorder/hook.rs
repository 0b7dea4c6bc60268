use super::RecorderHandle;
use crate::{InputEvent, InputEventKind, MacroRecorderError, Result};
use rdev::{Button, EventType};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// The global input hook.
///
/// `rdev::listen` blocks its thread for the life of the process, so the
/// hook runs on a dedicated thread and only enqueues timestamped
/// notifications to the recorder. Stopping sets a flag that makes the
/// callback drop everything; the listener itself cannot be torn down.
#[derive(Debug)]
pub struct InputHook {
    stop_indicator: Arc<AtomicBool>,
}

impl InputHook {
    /// Register the hook and start forwarding to `recorder`.
    ///
    /// Registration failures surface asynchronously as
    /// [`RecorderEvent::HookFailed`](super::RecorderEvent::HookFailed).
    pub fn start(recorder: RecorderHandle) -> Result<Self> {
        let stop_indicator = Arc::new(AtomicBool::new(false));
        let callback_stop = Arc::clone(&stop_indicator);

        thread::Builder::new()
            .name("input-hook".to_string())
            .spawn(move || {
                let forward = recorder.clone();
                let tracker = RefCell::new(DragTracker::default());

                let result = rdev::listen(move |event| {
                    if callback_stop.load(Ordering::SeqCst) {
                        return;
                    }
                    let Some(kind) = tracker.borrow_mut().classify(&event.event_type) else {
                        return;
                    };
                    // A closed channel means the recorder is gone; nothing to do.
                    let _ = forward.send_input(InputEvent::now(kind));
                });

                if let Err(e) = result {
                    error!("Failed to listen for events: {:?}", e);
                    let _ = recorder.hook_failed(format!("{:?}", e));
                }
                info!("Input hook thread has finished");
            })
            .map_err(|e| MacroRecorderError::HookError(e.to_string()))?;

        debug!("Input hook thread spawned");
        Ok(Self { stop_indicator })
    }

    pub fn stop(&self) {
        self.stop_indicator.store(true, Ordering::SeqCst);
        info!("Input hook stopped; the platform listener stays registered until exit");
    }
}

impl Drop for InputHook {
    fn drop(&mut self) {
        self.stop_indicator.store(true, Ordering::SeqCst);
    }
}

/// Turns raw hook events into [`InputEventKind`]s, reporting mouse motion
/// as a drag while any button is held.
#[derive(Debug, Default)]
pub struct DragTracker {
    held_buttons: Vec<Button>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        !self.held_buttons.is_empty()
    }

    /// `None` for events the recorder ignores (wheel).
    pub fn classify(&mut self, event: &EventType) -> Option<InputEventKind> {
        let kind = match *event {
            EventType::KeyPress(key) => InputEventKind::KeyPressed(key),
            EventType::KeyRelease(key) => InputEventKind::KeyReleased(key),
            EventType::ButtonPress(button) => {
                if !self.held_buttons.contains(&button) {
                    self.held_buttons.push(button);
                }
                InputEventKind::ButtonPressed(button)
            }
            EventType::ButtonRelease(button) => {
                self.held_buttons.retain(|b| *b != button);
                InputEventKind::ButtonReleased(button)
            }
            EventType::MouseMove { x, y } => {
                let (x, y) = (x.round() as i32, y.round() as i32);
                if self.is_dragging() {
                    InputEventKind::MouseDragged { x, y }
                } else {
                    InputEventKind::MouseMoved { x, y }
                }
            }
            EventType::Wheel { .. } => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdev::Key;

    fn move_to(x: f64, y: f64) -> EventType {
        EventType::MouseMove { x, y }
    }

    #[test]
    fn test_move_without_buttons_is_a_move() {
        let mut tracker = DragTracker::new();
        assert_eq!(
            tracker.classify(&move_to(10.4, 19.6)),
            Some(InputEventKind::MouseMoved { x: 10, y: 20 })
        );
    }

    #[test]
    fn test_move_while_button_held_is_a_drag() {
        let mut tracker = DragTracker::new();
        assert_eq!(
            tracker.classify(&EventType::ButtonPress(Button::Left)),
            Some(InputEventKind::ButtonPressed(Button::Left))
        );
        assert_eq!(
            tracker.classify(&move_to(5.0, 6.0)),
            Some(InputEventKind::MouseDragged { x: 5, y: 6 })
        );
        assert_eq!(
            tracker.classify(&EventType::ButtonRelease(Button::Left)),
            Some(InputEventKind::ButtonReleased(Button::Left))
        );
        assert_eq!(
            tracker.classify(&move_to(7.0, 8.0)),
            Some(InputEventKind::MouseMoved { x: 7, y: 8 })
        );
    }

    #[test]
    fn test_drag_lasts_until_every_button_is_released() {
        let mut tracker = DragTracker::new();
        tracker.classify(&EventType::ButtonPress(Button::Left));
        tracker.classify(&EventType::ButtonPress(Button::Right));
        // a repeated press does not need a second release
        tracker.classify(&EventType::ButtonPress(Button::Left));
        tracker.classify(&EventType::ButtonRelease(Button::Left));
        assert_eq!(
            tracker.classify(&move_to(1.0, 1.0)),
            Some(InputEventKind::MouseDragged { x: 1, y: 1 })
        );
        tracker.classify(&EventType::ButtonRelease(Button::Right));
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn test_keys_pass_through_and_wheel_is_ignored() {
        let mut tracker = DragTracker::new();
        assert_eq!(
            tracker.classify(&EventType::KeyPress(Key::KeyA)),
            Some(InputEventKind::KeyPressed(Key::KeyA))
        );
        assert_eq!(
            tracker.classify(&EventType::KeyRelease(Key::KeyA)),
            Some(InputEventKind::KeyReleased(Key::KeyA))
        );
        assert_eq!(
            tracker.classify(&EventType::Wheel { delta_x: 0, delta_y: -1 }),
            None
        );
        assert!(!tracker.is_dragging());
    }
}
