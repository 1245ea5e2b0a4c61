// Tapkeys Key Type
// Linux input-event key codes and X keysym name lookup

use std::fmt;

use crate::modifier::ModifierKind;

/// Represents a single keyboard key code.
///
/// The numeric values match Linux input-event-codes.h definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl Key {
    pub const ESC: Key = Key(1);
    pub const ENTER: Key = Key(28);
    pub const LEFT_CTRL: Key = Key(29);
    pub const LEFT_SHIFT: Key = Key(42);
    pub const LEFT_ALT: Key = Key(56);
    pub const SPACE: Key = Key(57);
    pub const LEFT_META: Key = Key(125);
    pub const U: Key = Key(22);

    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Key held for a sticky modifier
    pub fn for_modifier(kind: ModifierKind) -> Key {
        match kind {
            ModifierKind::Ctrl => Key::LEFT_CTRL,
            ModifierKind::Alt => Key::LEFT_ALT,
            ModifierKind::Shift => Key::LEFT_SHIFT,
            ModifierKind::Super => Key::LEFT_META,
        }
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

const LETTERS: [u16; 26] = [
    30, 48, 46, 32, 18, 33, 34, 35, 23, 36, 37, 38, 50, // a-m
    49, 24, 25, 16, 19, 31, 20, 22, 47, 17, 45, 21, 44, // n-z
];

const KEYSYMS: &[(&str, u16)] = &[
    ("Escape", 1),
    ("minus", 12),
    ("equal", 13),
    ("BackSpace", 14),
    ("Tab", 15),
    ("bracketleft", 26),
    ("bracketright", 27),
    ("Return", 28),
    ("enter", 28),
    ("Control_L", 29),
    ("ctrl", 29),
    ("semicolon", 39),
    ("apostrophe", 40),
    ("grave", 41),
    ("Shift_L", 42),
    ("shift", 42),
    ("backslash", 43),
    ("comma", 51),
    ("period", 52),
    ("slash", 53),
    ("Shift_R", 54),
    ("KP_Multiply", 55),
    ("Alt_L", 56),
    ("alt", 56),
    ("space", 57),
    ("Caps_Lock", 58),
    ("F1", 59),
    ("F2", 60),
    ("F3", 61),
    ("F4", 62),
    ("F5", 63),
    ("F6", 64),
    ("F7", 65),
    ("F8", 66),
    ("F9", 67),
    ("F10", 68),
    ("Num_Lock", 69),
    ("Scroll_Lock", 70),
    ("KP_Subtract", 74),
    ("KP_Add", 78),
    ("F11", 87),
    ("F12", 88),
    ("KP_Enter", 96),
    ("Control_R", 97),
    ("KP_Divide", 98),
    ("XP_Divide", 98),
    ("Print", 99),
    ("Alt_R", 100),
    ("Home", 102),
    ("Up", 103),
    ("Prior", 104),
    ("Page_Up", 104),
    ("Left", 105),
    ("Right", 106),
    ("End", 107),
    ("Down", 108),
    ("Next", 109),
    ("Page_Down", 109),
    ("Insert", 110),
    ("Delete", 111),
    ("XF86AudioMute", 113),
    ("XF86AudioLowerVolume", 114),
    ("XF86AudioRaiseVolume", 115),
    ("Pause", 119),
    ("Super_L", 125),
    ("super", 125),
    ("Super_R", 126),
    ("Menu", 139),
    ("XF86AudioNext", 163),
    ("XF86AudioPlay", 164),
    ("XF86AudioPrev", 165),
];

/// Resolve an X keysym name (case-insensitive) to a key code.
///
/// Single letters and digits resolve to their unshifted key.
pub fn keysym_to_key(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return ascii_key_and_shift(ch.to_ascii_lowercase()).map(|(key, _)| key);
    }

    KEYSYMS
        .iter()
        .find(|(sym, _)| sym.eq_ignore_ascii_case(name))
        .map(|(_, code)| Key(*code))
}

/// Key and shift state that type an ASCII character on a US layout
pub fn ascii_key_and_shift(ch: char) -> Option<(Key, bool)> {
    if ch.is_ascii_lowercase() {
        return Some((Key(LETTERS[(ch as u8 - b'a') as usize]), false));
    }
    if ch.is_ascii_uppercase() {
        return Some((Key(LETTERS[(ch as u8 - b'A') as usize]), true));
    }
    if ch.is_ascii_digit() {
        // KEY_1 = 2 ... KEY_9 = 10, KEY_0 = 11
        let code = if ch == '0' { 11 } else { (ch as u8 - b'1') as u16 + 2 };
        return Some((Key(code), false));
    }

    let (code, shift) = match ch {
        ' ' => (57, false),
        '\n' => (28, false),
        '\t' => (15, false),
        '-' => (12, false),
        '_' => (12, true),
        '=' => (13, false),
        '+' => (13, true),
        '[' => (26, false),
        '{' => (26, true),
        ']' => (27, false),
        '}' => (27, true),
        '\\' => (43, false),
        '|' => (43, true),
        ';' => (39, false),
        ':' => (39, true),
        '\'' => (40, false),
        '"' => (40, true),
        ',' => (51, false),
        '<' => (51, true),
        '.' => (52, false),
        '>' => (52, true),
        '/' => (53, false),
        '?' => (53, true),
        '`' => (41, false),
        '~' => (41, true),
        '!' => (2, true),
        '@' => (3, true),
        '#' => (4, true),
        '$' => (5, true),
        '%' => (6, true),
        '^' => (7, true),
        '&' => (8, true),
        '*' => (9, true),
        '(' => (10, true),
        ')' => (11, true),
        _ => return None,
    };
    Some((Key(code), shift))
}

/// Key that types a hexadecimal digit during Unicode entry
pub fn hex_digit_key(ch: char) -> Option<Key> {
    match ch {
        '0'..='9' | 'a'..='f' => ascii_key_and_shift(ch).map(|(key, _)| key),
        'A'..='F' => ascii_key_and_shift(ch.to_ascii_lowercase()).map(|(key, _)| key),
        _ => None,
    }
}
