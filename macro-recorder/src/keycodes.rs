//! Translation between platform key/button identifiers and the code space
//! stored on the timeline.
//!
//! Key codes follow the Windows virtual-key numbering. Keys without an entry
//! translate to [`KEY_UNDEFINED`]; buttons other than left/middle/right
//! translate to [`BUTTON_NONE`].

use rdev::{Button, Key};

pub const KEY_UNDEFINED: u32 = 0;

pub const BUTTON_NONE: u32 = 0;
pub const BUTTON_LEFT: u32 = 1;
pub const BUTTON_MIDDLE: u32 = 2;
pub const BUTTON_RIGHT: u32 = 3;

pub const SHIFT_MASK: u32 = 1;
pub const CTRL_MASK: u32 = 1 << 1;
pub const META_MASK: u32 = 1 << 2;
pub const ALT_MASK: u32 = 1 << 3;

pub const VK_BACK: u32 = 0x08;
pub const VK_TAB: u32 = 0x09;
pub const VK_RETURN: u32 = 0x0D;
pub const VK_ESCAPE: u32 = 0x1B;
pub const VK_SPACE: u32 = 0x20;
pub const VK_A: u32 = 0x41;
pub const VK_P: u32 = 0x50;
pub const VK_R: u32 = 0x52;
pub const VK_LSHIFT: u32 = 0xA0;
pub const VK_RSHIFT: u32 = 0xA1;
pub const VK_LCONTROL: u32 = 0xA2;
pub const VK_RCONTROL: u32 = 0xA3;
pub const VK_LMENU: u32 = 0xA4;
pub const VK_RMENU: u32 = 0xA5;
pub const VK_LWIN: u32 = 0x5B;
pub const VK_RWIN: u32 = 0x5C;

const KEY_TABLE: &[(Key, u32, &str)] = &[
    // Alphanumeric
    (Key::KeyA, VK_A, "A"),
    (Key::KeyB, 0x42, "B"),
    (Key::KeyC, 0x43, "C"),
    (Key::KeyD, 0x44, "D"),
    (Key::KeyE, 0x45, "E"),
    (Key::KeyF, 0x46, "F"),
    (Key::KeyG, 0x47, "G"),
    (Key::KeyH, 0x48, "H"),
    (Key::KeyI, 0x49, "I"),
    (Key::KeyJ, 0x4A, "J"),
    (Key::KeyK, 0x4B, "K"),
    (Key::KeyL, 0x4C, "L"),
    (Key::KeyM, 0x4D, "M"),
    (Key::KeyN, 0x4E, "N"),
    (Key::KeyO, 0x4F, "O"),
    (Key::KeyP, VK_P, "P"),
    (Key::KeyQ, 0x51, "Q"),
    (Key::KeyR, VK_R, "R"),
    (Key::KeyS, 0x53, "S"),
    (Key::KeyT, 0x54, "T"),
    (Key::KeyU, 0x55, "U"),
    (Key::KeyV, 0x56, "V"),
    (Key::KeyW, 0x57, "W"),
    (Key::KeyX, 0x58, "X"),
    (Key::KeyY, 0x59, "Y"),
    (Key::KeyZ, 0x5A, "Z"),
    (Key::Num0, 0x30, "0"),
    (Key::Num1, 0x31, "1"),
    (Key::Num2, 0x32, "2"),
    (Key::Num3, 0x33, "3"),
    (Key::Num4, 0x34, "4"),
    (Key::Num5, 0x35, "5"),
    (Key::Num6, 0x36, "6"),
    (Key::Num7, 0x37, "7"),
    (Key::Num8, 0x38, "8"),
    (Key::Num9, 0x39, "9"),
    (Key::BackQuote, 0xC0, "`"),
    (Key::Minus, 0xBD, "-"),
    (Key::Equal, 0xBB, "="),
    (Key::LeftBracket, 0xDB, "["),
    (Key::RightBracket, 0xDD, "]"),
    (Key::BackSlash, 0xDC, "\\"),
    (Key::IntlBackslash, 0xE2, "Intl\\"),
    (Key::SemiColon, 0xBA, ";"),
    (Key::Quote, 0xDE, "'"),
    (Key::Comma, 0xBC, ","),
    (Key::Dot, 0xBE, "."),
    (Key::Slash, 0xBF, "/"),
    (Key::Space, VK_SPACE, "Space"),
    (Key::Tab, VK_TAB, "Tab"),
    (Key::Return, VK_RETURN, "Enter"),
    (Key::Backspace, VK_BACK, "Backspace"),
    (Key::CapsLock, 0x14, "Caps Lock"),
    (Key::Escape, VK_ESCAPE, "Escape"),
    // Function keys
    (Key::F1, 0x70, "F1"),
    (Key::F2, 0x71, "F2"),
    (Key::F3, 0x72, "F3"),
    (Key::F4, 0x73, "F4"),
    (Key::F5, 0x74, "F5"),
    (Key::F6, 0x75, "F6"),
    (Key::F7, 0x76, "F7"),
    (Key::F8, 0x77, "F8"),
    (Key::F9, 0x78, "F9"),
    (Key::F10, 0x79, "F10"),
    (Key::F11, 0x7A, "F11"),
    (Key::F12, 0x7B, "F12"),
    (Key::PrintScreen, 0x2C, "Print Screen"),
    (Key::ScrollLock, 0x91, "Scroll Lock"),
    (Key::Pause, 0x13, "Pause"),
    // Editing and navigation
    (Key::Insert, 0x2D, "Insert"),
    (Key::Delete, 0x2E, "Delete"),
    (Key::Home, 0x24, "Home"),
    (Key::End, 0x23, "End"),
    (Key::PageUp, 0x21, "Page Up"),
    (Key::PageDown, 0x22, "Page Down"),
    (Key::LeftArrow, 0x25, "Left"),
    (Key::UpArrow, 0x26, "Up"),
    (Key::RightArrow, 0x27, "Right"),
    (Key::DownArrow, 0x28, "Down"),
    // Keypad
    (Key::NumLock, 0x90, "Num Lock"),
    (Key::Kp0, 0x60, "NumPad-0"),
    (Key::Kp1, 0x61, "NumPad-1"),
    (Key::Kp2, 0x62, "NumPad-2"),
    (Key::Kp3, 0x63, "NumPad-3"),
    (Key::Kp4, 0x64, "NumPad-4"),
    (Key::Kp5, 0x65, "NumPad-5"),
    (Key::Kp6, 0x66, "NumPad-6"),
    (Key::Kp7, 0x67, "NumPad-7"),
    (Key::Kp8, 0x68, "NumPad-8"),
    (Key::Kp9, 0x69, "NumPad-9"),
    (Key::KpMultiply, 0x6A, "NumPad *"),
    (Key::KpPlus, 0x6B, "NumPad +"),
    (Key::KpMinus, 0x6D, "NumPad -"),
    (Key::KpDelete, 0x6E, "NumPad ."),
    (Key::KpDivide, 0x6F, "NumPad /"),
    // Modifiers
    (Key::ShiftLeft, VK_LSHIFT, "Shift"),
    (Key::ShiftRight, VK_RSHIFT, "Right Shift"),
    (Key::ControlLeft, VK_LCONTROL, "Ctrl"),
    (Key::ControlRight, VK_RCONTROL, "Right Ctrl"),
    (Key::Alt, VK_LMENU, "Alt"),
    (Key::AltGr, VK_RMENU, "Alt Graph"),
    (Key::MetaLeft, VK_LWIN, "Meta"),
    (Key::MetaRight, VK_RWIN, "Right Meta"),
];

/// Translate a platform key into the stored code space
pub fn translate_key(key: &Key) -> u32 {
    KEY_TABLE
        .iter()
        .find(|(k, _, _)| k == key)
        .map(|(_, code, _)| *code)
        .unwrap_or(KEY_UNDEFINED)
}

/// The platform key for a stored code, if the code is known
pub fn key_for_code(code: u32) -> Option<Key> {
    if code == KEY_UNDEFINED {
        return None;
    }
    KEY_TABLE
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(key, _, _)| *key)
}

/// Human-readable label for a stored key code
pub fn key_name(code: u32) -> String {
    KEY_TABLE
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(_, _, name)| name.to_string())
        .unwrap_or_else(|| format!("Unknown keyCode: 0x{:x}", code))
}

/// Translate a platform mouse button into the stored code space
pub fn translate_button(button: &Button) -> u32 {
    match button {
        Button::Left => BUTTON_LEFT,
        Button::Middle => BUTTON_MIDDLE,
        Button::Right => BUTTON_RIGHT,
        Button::Unknown(_) => BUTTON_NONE,
    }
}

/// The platform button for a stored code
pub fn button_for_code(code: u32) -> Option<Button> {
    match code {
        BUTTON_LEFT => Some(Button::Left),
        BUTTON_MIDDLE => Some(Button::Middle),
        BUTTON_RIGHT => Some(Button::Right),
        _ => None,
    }
}

/// The modifier-mask bit contributed by a key code, or 0 for ordinary keys
pub fn modifier_bit(code: u32) -> u32 {
    match code {
        VK_LSHIFT | VK_RSHIFT => SHIFT_MASK,
        VK_LCONTROL | VK_RCONTROL => CTRL_MASK,
        VK_LWIN | VK_RWIN => META_MASK,
        VK_LMENU | VK_RMENU => ALT_MASK,
        _ => 0,
    }
}

/// Render a modifier mask as `Ctrl+Shift` style text, empty for no modifiers
pub fn modifiers_text(mask: u32) -> String {
    let mut parts = Vec::new();
    if mask & META_MASK != 0 {
        parts.push("Meta");
    }
    if mask & CTRL_MASK != 0 {
        parts.push("Ctrl");
    }
    if mask & ALT_MASK != 0 {
        parts.push("Alt");
    }
    if mask & SHIFT_MASK != 0 {
        parts.push("Shift");
    }
    parts.join("+")
}
