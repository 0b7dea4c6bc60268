//! Macro Recorder crate
//!
//! This crate records global keyboard and mouse activity, together with
//! periodic downsampled screen snapshots, onto a millisecond timeline, and
//! replays it by synthesizing the same input at the original relative
//! timing. The timeline can be edited and saved as a JSON file.
//!
//! The [`Engine`] holds all session state and is driven by one owner, the
//! [`MacroRecorder`] task; the platform hook and the tick only enqueue
//! messages to it.

pub mod capture;
pub mod engine;
pub mod error;
pub mod events;
pub mod hotkeys;
pub mod keycodes;
pub mod persistence;
pub mod platform;
pub mod playback;
pub mod recorder;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod timecode;
pub mod timeline;

pub use capture::{CaptureSink, KeyStroke};
pub use engine::{Engine, TickOutcome};
pub use error::*;
pub use events::*;
pub use hotkeys::{Hotkey, HotkeyAction, Hotkeys};
pub use persistence::RecordedData;
pub use platform::{RdevSynthesizer, XcapScreen};
pub use playback::{ActionLog, InputSynthesizer, PlaybackScheduler, TickProgress};
pub use recorder::{
    DragTracker, InputHook, MacroRecorder, RecorderEvent, RecorderHandle, RecorderSnapshot,
};
pub use session::{Session, SessionState};
pub use settings::Settings;
pub use snapshot::{downsample, ScreenSource, SnapshotStore};
pub use timecode::{format_time, parse_time};
pub use timeline::{Selection, Timeline};
