use crate::capture::CaptureSink;
use crate::hotkeys::{Hotkey, HotkeyAction};
use crate::persistence::RecordedData;
use crate::playback::{InputSynthesizer, PlaybackScheduler};
use crate::session::{Session, SessionState};
use crate::settings::Settings;
use crate::snapshot::{ScreenSource, SnapshotStore};
use crate::{InputEvent, MacroRecorderError, Result, ScreenState, Timeline};
use image::GrayImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Session clock at the tick
    pub current_time: u64,
    /// Synthesized actions emitted (playback only)
    pub actions: usize,
    /// Frame appended to the timeline (recording only)
    pub snapshot: Option<ScreenState>,
    /// Playback ran out of events and the session went idle
    pub finished: bool,
}

/// The capture/replay engine.
///
/// Owns the session, the timeline and every collaborator that mutates
/// them. Nothing here is synchronized: the engine expects a single owner
/// (see [`MacroRecorder`](crate::MacroRecorder)) feeding it input
/// notifications and ticks in order.
pub struct Engine {
    settings: Settings,
    session: Session,
    timeline: Timeline,
    capture: CaptureSink,
    scheduler: PlaybackScheduler,
    snapshots: SnapshotStore,
    synth: Box<dyn InputSynthesizer>,
    screen: Box<dyn ScreenSource>,
    tick_count: u64,
}

impl Engine {
    pub fn new(
        settings: Settings,
        synth: Box<dyn InputSynthesizer>,
        screen: Box<dyn ScreenSource>,
    ) -> Result<Self> {
        let snapshots = SnapshotStore::new(&settings.cache_dir).map_err(|e| {
            MacroRecorderError::InitializationError(format!(
                "cache directory {}: {}",
                settings.cache_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            capture: CaptureSink::new(settings.min_move_distance_sq),
            settings,
            session: Session::new(),
            timeline: Timeline::new(),
            scheduler: PlaybackScheduler::new(),
            snapshots,
            synth,
            screen,
            tick_count: 0,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable access for editors. Refused while a session is running.
    pub fn timeline_mut(&mut self) -> Result<&mut Timeline> {
        self.ensure_idle()?;
        Ok(&mut self.timeline)
    }

    pub fn change_hotkey(&mut self, action: HotkeyAction, hotkey: Hotkey) {
        self.settings.change_hotkey(action, hotkey);
    }

    /// Start a new recording. No-op outside IDLE.
    pub fn record(&mut self, now: Instant) -> bool {
        if !self.session.is_idle() {
            debug!(state = ?self.session.state(), "Ignoring record request");
            return false;
        }

        self.scheduler.reset();
        self.timeline.clear_events();
        if self.settings.clear_snapshots_on_record {
            self.timeline.clear_screen_states();
        }

        let rect = if self.settings.record_snapshots {
            match self.screen.screen_rect() {
                Ok(rect) => Some(rect),
                Err(e) => {
                    warn!(error = %e, "Could not read screen size, recording without snapshots");
                    None
                }
            }
        } else {
            None
        };

        self.tick_count = 0;
        self.session.begin(SessionState::Recording, now, rect);
        info!(capture_rect = ?rect, "Recording started");
        true
    }

    /// Start replaying the timeline. No-op outside IDLE or without any
    /// recorded mouse position.
    pub fn play_back(&mut self, now: Instant) -> bool {
        if !self.session.is_idle() {
            debug!(state = ?self.session.state(), "Ignoring playback request");
            return false;
        }
        if !self.timeline.has_mouse_positions() {
            debug!("Nothing to play back");
            return false;
        }

        self.timeline.sort_by_time();
        self.scheduler.reset();
        self.session.begin(SessionState::Playing, now, None);
        info!(
            length_ms = self.timeline.total_length(),
            mouse_positions = self.timeline.mouse_positions.len(),
            key_presses = self.timeline.key_presses.len(),
            mouse_presses = self.timeline.mouse_presses.len(),
            "Playback started"
        );
        true
    }

    /// Go idle from any state. Returns the state that was left.
    pub fn stop(&mut self) -> SessionState {
        let previous = self.session.end();
        if previous == SessionState::Playing && self.settings.release_held_on_stop {
            let released = self.scheduler.release_all(self.synth.as_mut());
            if released > 0 {
                info!(released, "Released held keys and buttons");
            }
        }
        if previous != SessionState::Idle {
            info!(from = ?previous, "Stopped");
        }
        previous
    }

    /// One period of the session clock
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        match self.session.state() {
            SessionState::Idle => TickOutcome::default(),
            SessionState::Recording => {
                let current_time = self.session.set_current_time(now);
                let due = self.tick_count % self.settings.snapshot_every_ticks() == 0;
                self.tick_count += 1;

                let snapshot = match self.session.capture_rect() {
                    Some(rect) if due => {
                        match self.snapshots.capture(self.screen.as_mut(), rect, current_time) {
                            Ok(state) => {
                                self.timeline.push_screen_state(state);
                                Some(state)
                            }
                            Err(e) => {
                                warn!(time = current_time, error = %e, "Snapshot failed");
                                None
                            }
                        }
                    }
                    _ => None,
                };

                TickOutcome {
                    current_time,
                    snapshot,
                    ..TickOutcome::default()
                }
            }
            SessionState::Playing => {
                let current_time = self.session.set_current_time(now);
                let progress =
                    self.scheduler
                        .advance(&self.timeline, current_time, self.synth.as_mut());
                if progress.finished {
                    self.session.end();
                    info!(current_time, "Playback finished");
                }
                TickOutcome {
                    current_time,
                    actions: progress.actions,
                    snapshot: None,
                    finished: progress.finished,
                }
            }
        }
    }

    /// Feed one raw input notification.
    ///
    /// The event is recorded while RECORDING; key-downs are matched against
    /// the hotkeys in every state and the triggered actions are applied at
    /// the event's own instant. Returns the triggered actions.
    pub fn handle_input(&mut self, event: &InputEvent) -> Vec<HotkeyAction> {
        let stroke = self.capture.observe(&event.kind);

        if self.session.state() == SessionState::Recording {
            let elapsed = self.session.elapsed_at(event.at);
            self.capture.record(&mut self.timeline, &event.kind, elapsed);
        }

        let Some(stroke) = stroke else {
            return Vec::new();
        };
        let actions = self
            .settings
            .hotkeys
            .triggered(&stroke, self.timeline.has_mouse_positions());

        for action in &actions {
            debug!(action = ?action, code = stroke.code, "Hotkey");
            match action {
                HotkeyAction::Record => {
                    self.record(event.at);
                }
                HotkeyAction::Play => {
                    self.play_back(event.at);
                }
                HotkeyAction::Stop => {
                    if self.stop() == SessionState::Recording {
                        // the stop key itself should not end up in the macro
                        self.timeline.discard_open_key_press(stroke.code);
                    }
                }
            }
        }
        actions
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.ensure_idle()?;
        RecordedData::from_timeline(&self.timeline).save_to_file(path)
    }

    /// Replace the three input streams with the file's. On failure the
    /// timeline is left untouched.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_idle()?;
        match RecordedData::load_from_file(path.as_ref()) {
            Ok(data) => {
                data.apply_to(&mut self.timeline);
                info!(path = %path.as_ref().display(), "Loaded macro");
                Ok(())
            }
            Err(e) => {
                error!(path = %path.as_ref().display(), error = %e, "Failed to load macro");
                Err(e)
            }
        }
    }

    /// The cached frame on screen at `time`, if any
    pub fn image_at(&self, time: u64) -> Option<GrayImage> {
        self.timeline
            .screen_state_at(time)
            .and_then(|state| self.snapshots.image_for(state))
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.session.state() {
            SessionState::Idle => Ok(()),
            state => Err(MacroRecorderError::Busy(state)),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("session", &self.session)
            .field("tick_count", &self.tick_count)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
