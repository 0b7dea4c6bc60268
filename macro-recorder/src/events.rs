use rdev::{Button, Key};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Anything placed on the timeline. Times are milliseconds since the
/// start of the session that produced them.
pub trait TimedObject {
    fn time(&self) -> u64;
    fn set_time(&mut self, time: u64);
}

/// Represents a position on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Represents a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A sampled pointer position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MousePos {
    pub time: u64,
    pub x: i32,
    pub y: i32,
}

impl MousePos {
    pub fn new(time: u64, x: i32, y: i32) -> Self {
        Self { time, x, y }
    }

    /// Squared distance to another point
    pub fn dist2(&self, x: i32, y: i32) -> i64 {
        let dx = i64::from(x) - i64::from(self.x);
        let dy = i64::from(y) - i64::from(self.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}

impl TimedObject for MousePos {
    fn time(&self) -> u64 {
        self.time
    }

    fn set_time(&mut self, time: u64) {
        self.time = time;
    }
}

/// A key or mouse-button activation.
///
/// `duration` is `None` while the press is open, i.e. its release has not
/// been observed yet. A closed press with `Some(0)` is a genuine zero-length
/// tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Press {
    pub time: u64,
    pub code: u32,
    #[serde(default)]
    pub duration: Option<u64>,
}

impl Press {
    /// Create a press whose release is still pending
    pub fn open(code: u32, time: u64) -> Self {
        Self {
            time,
            code,
            duration: None,
        }
    }

    pub fn closed(code: u32, time: u64, duration: u64) -> Self {
        Self {
            time,
            code,
            duration: Some(duration),
        }
    }

    pub fn is_open(&self) -> bool {
        self.duration.is_none()
    }

    /// Close the press at `at`; releases that precede the start clamp to zero
    pub fn close(&mut self, at: u64) {
        self.duration = Some(at.saturating_sub(self.time));
    }

    /// When the press ends, if it has ended
    pub fn end_time(&self) -> Option<u64> {
        self.duration.map(|d| self.time.saturating_add(d))
    }
}

impl TimedObject for Press {
    fn time(&self) -> u64 {
        self.time
    }

    fn set_time(&mut self, time: u64) {
        self.time = time;
    }
}

/// A captured screen frame. The raster itself lives in the snapshot store,
/// keyed by `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenState {
    pub time: u64,
    pub width: u32,
    pub height: u32,
}

impl TimedObject for ScreenState {
    fn time(&self) -> u64 {
        self.time
    }

    fn set_time(&mut self, time: u64) {
        self.time = time;
    }
}

/// A timeline entry of any editable kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedEvent {
    MousePos(MousePos),
    KeyPress(Press),
    MousePress(Press),
}

impl TimedEvent {
    /// The instant the event stops occupying the timeline
    pub fn end_time(&self) -> u64 {
        match self {
            TimedEvent::MousePos(pos) => pos.time,
            TimedEvent::KeyPress(press) | TimedEvent::MousePress(press) => {
                press.end_time().unwrap_or(press.time)
            }
        }
    }
}

impl TimedObject for TimedEvent {
    fn time(&self) -> u64 {
        match self {
            TimedEvent::MousePos(pos) => pos.time,
            TimedEvent::KeyPress(press) | TimedEvent::MousePress(press) => press.time,
        }
    }

    fn set_time(&mut self, time: u64) {
        match self {
            TimedEvent::MousePos(pos) => pos.set_time(time),
            TimedEvent::KeyPress(press) | TimedEvent::MousePress(press) => press.set_time(time),
        }
    }
}

/// Index of an entry in one of the three timeline streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventId {
    MousePos(usize),
    KeyPress(usize),
    MousePress(usize),
}

/// A raw notification from the global input hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEventKind {
    MouseMoved { x: i32, y: i32 },
    MouseDragged { x: i32, y: i32 },
    KeyPressed(Key),
    KeyReleased(Key),
    ButtonPressed(Button),
    ButtonReleased(Button),
}

/// A hook notification stamped with the moment it was observed
#[derive(Debug, Clone, Copy)]
pub struct InputEvent {
    pub kind: InputEventKind,
    pub at: Instant,
}

impl InputEvent {
    pub fn new(kind: InputEventKind, at: Instant) -> Self {
        Self { kind, at }
    }

    pub fn now(kind: InputEventKind) -> Self {
        Self::new(kind, Instant::now())
    }
}

/// An input action emitted by the playback scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthesizedAction {
    MouseMove { x: i32, y: i32 },
    KeyDown(u32),
    KeyUp(u32),
    ButtonDown(u32),
    ButtonUp(u32),
}
