use crate::{MacroRecorderError, MousePos, Press, Result, Timeline};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// The portable macro document: the three input streams, without screen
/// states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedData {
    pub mouse_positions: Vec<MousePos>,
    pub mouse_presses: Vec<Press>,
    pub key_presses: Vec<Press>,
}

impl RecordedData {
    pub fn from_timeline(timeline: &Timeline) -> Self {
        Self {
            mouse_positions: timeline.mouse_positions.clone(),
            mouse_presses: timeline.mouse_presses.clone(),
            key_presses: timeline.key_presses.clone(),
        }
    }

    /// Replace the timeline's three streams wholesale. Screen states are kept.
    pub fn apply_to(self, timeline: &mut Timeline) {
        timeline.mouse_positions = self.mouse_positions;
        timeline.mouse_presses = self.mouse_presses;
        timeline.key_presses = self.key_presses;
    }

    /// Serialize the macro to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a macro from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MacroRecorderError::LoadError(e.to_string()))
    }

    /// Save the macro to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path.as_ref(), json).map_err(|e| {
            MacroRecorderError::SaveError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        info!(
            path = %path.as_ref().display(),
            mouse_positions = self.mouse_positions.len(),
            key_presses = self.key_presses.len(),
            mouse_presses = self.mouse_presses.len(),
            "Saved macro"
        );
        Ok(())
    }

    /// Load a macro from a JSON file. Nothing is returned unless the whole
    /// document parses.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            MacroRecorderError::LoadError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScreenState;
    use tempfile::tempdir;

    fn sample() -> Timeline {
        let mut timeline = Timeline::new();
        timeline.push_mouse_pos(MousePos::new(0, 10, 20));
        timeline.push_mouse_pos(MousePos::new(16, -4, 7));
        timeline.key_presses.push(Press::closed(0x41, 3, 0));
        timeline.key_presses.push(Press::open(0x1B, 40));
        timeline.mouse_presses.push(Press::closed(1, 8, 120));
        timeline.push_screen_state(ScreenState { time: 40, width: 2, height: 2 });
        timeline
    }

    #[test]
    fn test_document_uses_named_arrays() {
        let json = RecordedData::from_timeline(&sample()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mousePositions"][1]["x"], -4);
        assert_eq!(value["keyPresses"][0]["duration"], 0);
        assert!(value["keyPresses"][1]["duration"].is_null());
        assert_eq!(value["mousePresses"][0]["code"], 1);
        assert!(value.get("screenStates").is_none());
    }

    #[test]
    fn test_load_replaces_streams_and_keeps_screen_states() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("macro.json");
        let original = sample();
        RecordedData::from_timeline(&original).save_to_file(&path).unwrap();

        let mut target = Timeline::new();
        target.push_mouse_pos(MousePos::new(999, 1, 1));
        target.push_screen_state(ScreenState { time: 5, width: 8, height: 8 });

        RecordedData::load_from_file(&path).unwrap().apply_to(&mut target);
        assert_eq!(target.mouse_positions, original.mouse_positions);
        assert_eq!(target.key_presses, original.key_presses);
        assert_eq!(target.mouse_presses, original.mouse_presses);
        assert_eq!(target.screen_states, vec![ScreenState { time: 5, width: 8, height: 8 }]);
    }

    #[test]
    fn test_save_load_save_is_stable() {
        let first = RecordedData::from_timeline(&sample()).to_json().unwrap();
        let second = RecordedData::from_json(&first).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"{ "mousePositions": [], "keyPresses": [] }"#;
        assert!(matches!(
            RecordedData::from_json(json),
            Err(MacroRecorderError::LoadError(_))
        ));
    }

    #[test]
    fn test_missing_duration_reads_as_open() {
        let json = r#"{ "mousePositions": [], "mousePresses": [],
                        "keyPresses": [{ "time": 4, "code": 65 }] }"#;
        let data = RecordedData::from_json(json).unwrap();
        assert!(data.key_presses[0].is_open());
    }
}
