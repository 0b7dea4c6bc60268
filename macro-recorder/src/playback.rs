use crate::{Press, Result, SynthesizedAction, Timeline};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Something that can inject input into the system
pub trait InputSynthesizer: Send {
    fn apply(&mut self, action: SynthesizedAction) -> Result<()>;
}

/// An [`InputSynthesizer`] that only remembers what it was asked to do.
/// Clones share the same log, so a caller can keep one while the engine
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    actions: Arc<Mutex<Vec<SynthesizedAction>>>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<SynthesizedAction> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Drain the log, returning what was recorded so far
    pub fn take(&self) -> Vec<SynthesizedAction> {
        self.actions
            .lock()
            .map(|mut a| std::mem::take(&mut *a))
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.clear();
        }
    }
}

impl InputSynthesizer for ActionLog {
    fn apply(&mut self, action: SynthesizedAction) -> Result<()> {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
        Ok(())
    }
}

/// Result of one scheduler step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickProgress {
    /// Actions emitted during this step
    pub actions: usize,
    /// Every stream is exhausted and nothing is held
    pub finished: bool,
}

/// Replay cursor over a [`Timeline`].
///
/// Keeps one index per stream plus the presses currently held down. Each
/// call to [`advance`](PlaybackScheduler::advance) fires everything due
/// before `current_time`, repeating until a full pass makes no progress so a
/// late tick catches up in one go.
///
/// Within a pass the order is: mouse move, key down, key releases, button
/// down, button releases. Releases run most-recently-pressed first.
#[derive(Debug, Clone, Default)]
pub struct PlaybackScheduler {
    mouse_index: usize,
    key_index: usize,
    button_index: usize,
    held_keys: Vec<Press>,
    held_buttons: Vec<Press>,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// (mouse, key, button) cursor positions
    pub fn cursors(&self) -> (usize, usize, usize) {
        (self.mouse_index, self.key_index, self.button_index)
    }

    pub fn held_keys(&self) -> &[Press] {
        &self.held_keys
    }

    pub fn held_buttons(&self) -> &[Press] {
        &self.held_buttons
    }

    pub fn is_finished(&self, timeline: &Timeline) -> bool {
        self.mouse_index >= timeline.mouse_positions.len()
            && self.key_index >= timeline.key_presses.len()
            && self.button_index >= timeline.mouse_presses.len()
            && self.held_keys.is_empty()
            && self.held_buttons.is_empty()
    }

    /// Fire everything due strictly before `current_time`.
    ///
    /// A press whose release was never recorded is released once the clock
    /// passes the end of the timeline.
    pub fn advance(
        &mut self,
        timeline: &Timeline,
        current_time: u64,
        synth: &mut dyn InputSynthesizer,
    ) -> TickProgress {
        let open_until = timeline.total_length();
        let mut emitted = 0;

        loop {
            let mut progressed = false;

            if let Some(pos) = timeline.mouse_positions.get(self.mouse_index) {
                if pos.time < current_time {
                    emit(synth, SynthesizedAction::MouseMove { x: pos.x, y: pos.y }, &mut emitted);
                    self.mouse_index += 1;
                    progressed = true;
                }
            }

            if let Some(press) = timeline.key_presses.get(self.key_index) {
                if press.time < current_time {
                    emit(synth, SynthesizedAction::KeyDown(press.code), &mut emitted);
                    self.held_keys.push(*press);
                    self.key_index += 1;
                    progressed = true;
                }
            }
            progressed |= release_due(
                &mut self.held_keys,
                current_time,
                open_until,
                synth,
                SynthesizedAction::KeyUp,
                &mut emitted,
            );

            if let Some(press) = timeline.mouse_presses.get(self.button_index) {
                if press.time < current_time {
                    emit(synth, SynthesizedAction::ButtonDown(press.code), &mut emitted);
                    self.held_buttons.push(*press);
                    self.button_index += 1;
                    progressed = true;
                }
            }
            progressed |= release_due(
                &mut self.held_buttons,
                current_time,
                open_until,
                synth,
                SynthesizedAction::ButtonUp,
                &mut emitted,
            );

            if !progressed {
                break;
            }
        }

        TickProgress {
            actions: emitted,
            finished: self.is_finished(timeline),
        }
    }

    /// Release everything still held, e.g. when playback is interrupted.
    /// Returns how many releases were sent.
    pub fn release_all(&mut self, synth: &mut dyn InputSynthesizer) -> usize {
        let mut emitted = 0;
        for press in self.held_keys.drain(..).rev() {
            emit(synth, SynthesizedAction::KeyUp(press.code), &mut emitted);
        }
        for press in self.held_buttons.drain(..).rev() {
            emit(synth, SynthesizedAction::ButtonUp(press.code), &mut emitted);
        }
        emitted
    }
}

fn emit(synth: &mut dyn InputSynthesizer, action: SynthesizedAction, emitted: &mut usize) {
    debug!(?action, "Synthesizing");
    if let Err(e) = synth.apply(action) {
        warn!(?action, error = %e, "Input synthesis failed");
    }
    *emitted += 1;
}

fn release_due(
    held: &mut Vec<Press>,
    current_time: u64,
    open_until: u64,
    synth: &mut dyn InputSynthesizer,
    release: fn(u32) -> SynthesizedAction,
    emitted: &mut usize,
) -> bool {
    let mut released = false;
    for i in (0..held.len()).rev() {
        let press = held[i];
        let release_at = press.end_time().unwrap_or(open_until);
        if release_at < current_time {
            emit(synth, release(press.code), emitted);
            held.remove(i);
            released = true;
        }
    }
    released
}
