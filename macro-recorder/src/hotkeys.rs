use crate::capture::KeyStroke;
use crate::keycodes::{key_name, modifiers_text, SHIFT_MASK, VK_ESCAPE, VK_P, VK_R};
use serde::{Deserialize, Serialize};

/// A global shortcut: a key code plus a modifier mask.
/// A mask of 0 accepts the key with any modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotkey {
    pub keycode: u32,
    pub modifiers: u32,
}

impl Hotkey {
    pub fn new(keycode: u32, modifiers: u32) -> Self {
        Self { keycode, modifiers }
    }

    pub fn accepts(&self, stroke: &KeyStroke) -> bool {
        stroke.code == self.keycode && (self.modifiers == 0 || stroke.modifiers == self.modifiers)
    }

    /// e.g. `Shift+R`
    pub fn name(&self) -> String {
        let modifiers = modifiers_text(self.modifiers);
        if modifiers.is_empty() {
            key_name(self.keycode)
        } else {
            format!("{}+{}", modifiers, key_name(self.keycode))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HotkeyAction {
    Record,
    Play,
    Stop,
}

impl HotkeyAction {
    /// Settings key the binding is stored under
    pub fn setting_key(&self) -> &'static str {
        match self {
            HotkeyAction::Record => "record_key",
            HotkeyAction::Play => "play_key",
            HotkeyAction::Stop => "stop_key",
        }
    }
}

/// Bindings for the three global actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    #[serde(rename = "record_key")]
    pub record: Hotkey,
    #[serde(rename = "play_key")]
    pub play: Hotkey,
    #[serde(rename = "stop_key")]
    pub stop: Hotkey,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            record: Hotkey::new(VK_R, SHIFT_MASK),
            play: Hotkey::new(VK_P, SHIFT_MASK),
            stop: Hotkey::new(VK_ESCAPE, 0),
        }
    }
}

impl Hotkeys {
    pub fn get(&self, action: HotkeyAction) -> Hotkey {
        match action {
            HotkeyAction::Record => self.record,
            HotkeyAction::Play => self.play,
            HotkeyAction::Stop => self.stop,
        }
    }

    pub fn set(&mut self, action: HotkeyAction, hotkey: Hotkey) {
        match action {
            HotkeyAction::Record => self.record = hotkey,
            HotkeyAction::Play => self.play = hotkey,
            HotkeyAction::Stop => self.stop = hotkey,
        }
    }

    /// Actions fired by a key-down, in the order they should be applied.
    ///
    /// Play wins over record when both match, and only fires when there is
    /// something to play. Stop is checked independently.
    pub fn triggered(&self, stroke: &KeyStroke, can_play: bool) -> Vec<HotkeyAction> {
        let mut actions = Vec::new();
        if self.play.accepts(stroke) && can_play {
            actions.push(HotkeyAction::Play);
        } else if self.record.accepts(stroke) {
            actions.push(HotkeyAction::Record);
        }
        if self.stop.accepts(stroke) {
            actions.push(HotkeyAction::Stop);
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycodes::CTRL_MASK;

    fn stroke(code: u32, modifiers: u32) -> KeyStroke {
        KeyStroke { code, modifiers }
    }

    #[test]
    fn test_zero_mask_accepts_any_modifiers() {
        let stop = Hotkey::new(VK_ESCAPE, 0);
        assert!(stop.accepts(&stroke(VK_ESCAPE, 0)));
        assert!(stop.accepts(&stroke(VK_ESCAPE, CTRL_MASK | SHIFT_MASK)));
        assert!(!stop.accepts(&stroke(VK_R, 0)));
    }

    #[test]
    fn test_mask_must_match_exactly() {
        let record = Hotkey::new(VK_R, SHIFT_MASK);
        assert!(record.accepts(&stroke(VK_R, SHIFT_MASK)));
        assert!(!record.accepts(&stroke(VK_R, 0)));
        assert!(!record.accepts(&stroke(VK_R, SHIFT_MASK | CTRL_MASK)));
    }

    #[test]
    fn test_play_requires_mouse_positions() {
        let hotkeys = Hotkeys::default();
        assert!(hotkeys.triggered(&stroke(VK_P, SHIFT_MASK), false).is_empty());
        assert_eq!(
            hotkeys.triggered(&stroke(VK_P, SHIFT_MASK), true),
            vec![HotkeyAction::Play]
        );
    }

    #[test]
    fn test_play_beats_record_on_shared_binding() {
        let mut hotkeys = Hotkeys::default();
        hotkeys.set(HotkeyAction::Play, Hotkey::new(VK_R, SHIFT_MASK));
        let shared = stroke(VK_R, SHIFT_MASK);
        assert_eq!(hotkeys.triggered(&shared, true), vec![HotkeyAction::Play]);
        assert_eq!(hotkeys.triggered(&shared, false), vec![HotkeyAction::Record]);
    }

    #[test]
    fn test_hotkey_names() {
        let hotkeys = Hotkeys::default();
        assert_eq!(hotkeys.record.name(), "Shift+R");
        assert_eq!(hotkeys.stop.name(), "Escape");
    }

    #[test]
    fn test_hotkeys_serialize_by_action_name() {
        let json = serde_json::to_value(Hotkeys::default()).unwrap();
        assert_eq!(json["record_key"]["keycode"], VK_R);
        assert_eq!(json["play_key"]["modifiers"], SHIFT_MASK);
        assert_eq!(json["stop_key"]["modifiers"], 0);
    }
}
