use crate::{EventId, MousePos, Position, Press, ScreenState, TimedEvent, TimedObject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The recorded macro: three independently time-ordered event streams plus
/// the screen snapshots taken while recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub mouse_positions: Vec<MousePos>,
    pub mouse_presses: Vec<Press>,
    pub key_presses: Vec<Press>,
    pub screen_states: Vec<ScreenState>,
}

/// A set of selected timeline entries, as held by an editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<EventId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: EventId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: EventId) {
        self.ids.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<EventId> for Selection {
    fn from_iter<I: IntoIterator<Item = EventId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the three input streams, keeping screen states
    pub fn clear_events(&mut self) {
        self.mouse_positions.clear();
        self.mouse_presses.clear();
        self.key_presses.clear();
    }

    pub fn clear_screen_states(&mut self) {
        self.screen_states.clear();
    }

    pub fn has_mouse_positions(&self) -> bool {
        !self.mouse_positions.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.mouse_positions.is_empty() && self.mouse_presses.is_empty() && self.key_presses.is_empty()
    }

    pub fn last_mouse_pos(&self) -> Option<&MousePos> {
        self.mouse_positions.last()
    }

    pub fn push_mouse_pos(&mut self, pos: MousePos) {
        self.mouse_positions.push(pos);
    }

    pub fn open_key_press(&mut self, code: u32, time: u64) {
        self.key_presses.push(Press::open(code, time));
    }

    pub fn open_mouse_press(&mut self, code: u32, time: u64) {
        self.mouse_presses.push(Press::open(code, time));
    }

    /// Close the latest key press with `code` if it is still open.
    /// Returns false when the release has nothing to close.
    pub fn close_key_press(&mut self, code: u32, at: u64) -> bool {
        close_last(&mut self.key_presses, code, at)
    }

    pub fn close_mouse_press(&mut self, code: u32, at: u64) -> bool {
        close_last(&mut self.mouse_presses, code, at)
    }

    /// Remove the latest key press with `code` if it is still open
    pub fn discard_open_key_press(&mut self, code: u32) -> bool {
        match self.key_presses.iter().rposition(|p| p.code == code) {
            Some(index) if self.key_presses[index].is_open() => {
                self.key_presses.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Append a frame. A kept frame with the same timestamp is dropped,
    /// since both would name the same cached file.
    pub fn push_screen_state(&mut self, state: ScreenState) {
        self.screen_states.retain(|s| s.time != state.time);
        self.screen_states.push(state);
    }

    /// Stable-sort every stream by time. Edits can leave a stream out of order.
    pub fn sort_by_time(&mut self) {
        self.mouse_positions.sort_by_key(|p| p.time);
        self.mouse_presses.sort_by_key(|p| p.time);
        self.key_presses.sort_by_key(|p| p.time);
        self.screen_states.sort_by_key(|s| s.time);
    }

    pub fn get(&self, id: EventId) -> Option<TimedEvent> {
        match id {
            EventId::MousePos(i) => self.mouse_positions.get(i).copied().map(TimedEvent::MousePos),
            EventId::KeyPress(i) => self.key_presses.get(i).copied().map(TimedEvent::KeyPress),
            EventId::MousePress(i) => self.mouse_presses.get(i).copied().map(TimedEvent::MousePress),
        }
    }

    pub fn set_time(&mut self, id: EventId, time: u64) -> bool {
        let target: Option<&mut dyn TimedObject> = match id {
            EventId::MousePos(i) => self.mouse_positions.get_mut(i).map(|p| p as &mut dyn TimedObject),
            EventId::KeyPress(i) => self.key_presses.get_mut(i).map(|p| p as &mut dyn TimedObject),
            EventId::MousePress(i) => self.mouse_presses.get_mut(i).map(|p| p as &mut dyn TimedObject),
        };
        match target {
            Some(obj) => {
                obj.set_time(time);
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, index: usize, x: i32, y: i32) -> bool {
        match self.mouse_positions.get_mut(index) {
            Some(pos) => {
                pos.x = x;
                pos.y = y;
                true
            }
            None => false,
        }
    }

    /// Move every selected entry by `delta_ms`, clamping at zero.
    /// Returns how many entries moved.
    pub fn shift_times(&mut self, selection: &Selection, delta_ms: i64) -> usize {
        let mut moved = 0;
        for id in selection.iter() {
            if let Some(event) = self.get(id) {
                let time = shift(event.time(), delta_ms);
                if self.set_time(id, time) {
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Translate the selected mouse samples; presses in the selection are ignored
    pub fn translate_positions(&mut self, selection: &Selection, dx: i32, dy: i32) -> usize {
        let mut moved = 0;
        for id in selection.iter() {
            if let EventId::MousePos(i) = id {
                if let Some(pos) = self.mouse_positions.get_mut(i) {
                    pos.x = pos.x.saturating_add(dx);
                    pos.y = pos.y.saturating_add(dy);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Latest end time over all three streams
    pub fn total_length(&self) -> u64 {
        let mouse = self.mouse_positions.iter().map(|p| p.time);
        let presses = self
            .key_presses
            .iter()
            .chain(self.mouse_presses.iter())
            .map(|p| p.end_time().unwrap_or(p.time));
        mouse.chain(presses).max().unwrap_or(0)
    }

    /// Key codes in order of first appearance
    pub fn distinct_key_codes(&self) -> Vec<u32> {
        let mut codes = Vec::new();
        for press in &self.key_presses {
            if !codes.contains(&press.code) {
                codes.push(press.code);
            }
        }
        codes
    }

    /// The frame on screen at `time`: the one whose interval contains it,
    /// or the nearer end frame when `time` is outside the captured range.
    pub fn screen_state_at(&self, time: u64) -> Option<&ScreenState> {
        let states = &self.screen_states;
        let (first, last) = (states.first()?, states.last()?);
        if let Some(window) = states
            .windows(2)
            .find(|w| w[0].time <= time && w[1].time > time)
        {
            return Some(&window[0]);
        }
        if first.time.abs_diff(time) < last.time.abs_diff(time) {
            Some(first)
        } else {
            Some(last)
        }
    }

    /// Pointer position at `time`, interpolated between the surrounding samples
    pub fn cursor_at(&self, time: u64) -> Option<Position> {
        let positions = &self.mouse_positions;
        let first = positions.first()?;
        if time <= first.time {
            return Some(first.position());
        }
        for pair in positions.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.time <= time && time < next.time {
                let t = (time - prev.time) as f64 / (next.time - prev.time) as f64;
                let x = f64::from(prev.x) + t * (f64::from(next.x) - f64::from(prev.x));
                let y = f64::from(prev.y) + t * (f64::from(next.y) - f64::from(prev.y));
                return Some(Position {
                    x: x.round() as i32,
                    y: y.round() as i32,
                });
            }
        }
        positions.last().map(MousePos::position)
    }

    /// Entries visible in a zoom window of `range` ms either side of `center`
    pub fn events_in_window(&self, center: u64, range: u64) -> Vec<(EventId, TimedEvent)> {
        let lo = center.saturating_sub(range);
        let hi = center.saturating_add(range);
        let press_visible = |p: &Press| p.time <= hi && lo <= p.end_time().unwrap_or(p.time);

        let mut visible = Vec::new();
        for (i, pos) in self.mouse_positions.iter().enumerate() {
            if pos.time.abs_diff(center) < range {
                visible.push((EventId::MousePos(i), TimedEvent::MousePos(*pos)));
            }
        }
        for (i, press) in self.key_presses.iter().enumerate() {
            if press_visible(press) {
                visible.push((EventId::KeyPress(i), TimedEvent::KeyPress(*press)));
            }
        }
        for (i, press) in self.mouse_presses.iter().enumerate() {
            if press_visible(press) {
                visible.push((EventId::MousePress(i), TimedEvent::MousePress(*press)));
            }
        }
        visible
    }
}

// Only the most recent same-code press is a candidate; if it is already
// closed the release is dropped.
fn close_last(presses: &mut [Press], code: u32, at: u64) -> bool {
    match presses.iter_mut().rev().find(|p| p.code == code) {
        Some(press) if press.is_open() => {
            press.close(at);
            true
        }
        _ => false,
    }
}

fn shift(time: u64, delta_ms: i64) -> u64 {
    if delta_ms >= 0 {
        time.saturating_add(delta_ms as u64)
    } else {
        time.saturating_sub(delta_ms.unsigned_abs())
    }
}
