// Tapkeys Actions
// Layout slot actions and the output actions handed to dispatchers

use std::fmt;

use crate::modifier::{HeldModifier, ModifierKind};

/// Token that switches mode based on the held modifiers
pub const MODE: &str = "mode";
/// Token that toggles the locked form of the current mode
pub const SET: &str = "set";
/// Token that starts a composition (or sends enter under ctrl)
pub const COMPOSE: &str = "compose";
/// Token that only clears state
pub const RESET: &str = "reset";

pub const ENTER: &str = "enter";
pub const CAPS_LOCK: &str = "Caps_Lock";

/// One step bound to a layout slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Switch to the mode selected by the held modifiers
    ModeSwitch,
    /// Switch directly to a declared mode, locked when spelled upper-case
    Mode { index: usize, locked: bool },
    /// Press (or release, when already held) a sticky modifier
    Modifier(HeldModifier),
    /// Single character, typed literally
    Character(String),
    /// Named key, or one of the reserved names `set`, `compose`, `reset`
    Special(String),
}

impl KeyAction {
    /// Classify an already-normalized layout token.
    ///
    /// `mode_index` resolves declared mode names (case-insensitively).
    pub fn classify(token: &str, mode_index: impl Fn(&str) -> Option<usize>) -> Self {
        if token == MODE {
            return KeyAction::ModeSwitch;
        }
        if let Some(index) = mode_index(token) {
            let locked = token != token.to_lowercase();
            return KeyAction::Mode { index, locked };
        }
        if let Some((kind, marked)) = ModifierKind::from_token(token) {
            return KeyAction::Modifier(HeldModifier::new(kind, marked));
        }
        if token.chars().count() == 1 {
            KeyAction::Character(token.to_string())
        } else {
            KeyAction::Special(token.to_string())
        }
    }

    /// Token used for composition lookups, `None` for state-only actions
    pub fn token(&self) -> Option<&str> {
        match self {
            KeyAction::Character(text) | KeyAction::Special(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::ModeSwitch => write!(f, "{}", MODE),
            KeyAction::Mode { index, locked } => {
                write!(f, "mode#{}{}", index, if *locked { "!" } else { "" })
            }
            KeyAction::Modifier(held) => write!(f, "{}", held),
            KeyAction::Character(text) | KeyAction::Special(text) => write!(f, "{}", text),
        }
    }
}

/// Action handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputAction {
    /// Press and keep a modifier down
    Hold(ModifierKind),
    /// Let a held modifier go
    Release(ModifierKind),
    /// Type literal text
    Type(String),
    /// Press and release a named key
    Press(String),
}

impl OutputAction {
    pub fn press(name: impl Into<String>) -> Self {
        OutputAction::Press(name.into())
    }

    pub fn type_text(text: impl Into<String>) -> Self {
        OutputAction::Type(text.into())
    }
}

impl fmt::Display for OutputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputAction::Hold(kind) => write!(f, "hold {}", kind),
            OutputAction::Release(kind) => write!(f, "release {}", kind),
            OutputAction::Type(text) => write!(f, "type {:?}", text),
            OutputAction::Press(name) => write!(f, "press {}", name),
        }
    }
}
