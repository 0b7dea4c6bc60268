use crate::Rect;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// What the recorder is currently doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Playing,
}

/// Clock and mode of the single running recorder
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    start_time: Option<Instant>,
    current_time: u64,
    capture_rect: Option<Rect>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Milliseconds since the session was anchored, as of the last tick
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn capture_rect(&self) -> Option<Rect> {
        self.capture_rect
    }

    /// Enter `state` with the clock anchored at `now`
    pub(crate) fn begin(&mut self, state: SessionState, now: Instant, capture_rect: Option<Rect>) {
        self.state = state;
        self.start_time = Some(now);
        self.current_time = 0;
        self.capture_rect = capture_rect;
    }

    /// Back to idle. The clock keeps its last reading for inspection.
    pub(crate) fn end(&mut self) -> SessionState {
        std::mem::replace(&mut self.state, SessionState::Idle)
    }

    /// Milliseconds between the anchor and `at`; instants before the anchor count as 0
    pub fn elapsed_at(&self, at: Instant) -> u64 {
        self.start_time
            .map(|start| at.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or(0)
    }

    pub(crate) fn set_current_time(&mut self, now: Instant) -> u64 {
        self.current_time = self.elapsed_at(now);
        self.current_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_is_relative_to_anchor() {
        let start = Instant::now();
        let mut session = Session::new();
        assert_eq!(session.elapsed_at(start), 0);

        session.begin(SessionState::Playing, start, None);
        assert_eq!(session.set_current_time(start + Duration::from_millis(42)), 42);
        assert_eq!(session.current_time(), 42);
        // an event stamped before the anchor counts as 0
        if let Some(before) = start.checked_sub(Duration::from_millis(5)) {
            assert_eq!(session.elapsed_at(before), 0);
        }
    }

    #[test]
    fn test_end_returns_previous_state() {
        let mut session = Session::new();
        session.begin(SessionState::Recording, Instant::now(), None);
        assert_eq!(session.end(), SessionState::Recording);
        assert!(session.is_idle());
        assert_eq!(session.end(), SessionState::Idle);
    }
}
