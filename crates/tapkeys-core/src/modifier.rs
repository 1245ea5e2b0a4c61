// Tapkeys Modifier System
// Sticky modifiers held across taps (ctrl, alt, shift, super)

use std::fmt;
use std::str::FromStr;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A recognized modifier.
///
/// Parsing is ASCII case-insensitive; display is always lower-case, which is
/// also the name handed to the dispatcher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModifierKind {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl ModifierKind {
    /// Parse a layout token into a modifier and its marked flag.
    ///
    /// An all upper-case spelling (`CTRL`) is the marked form: it releases
    /// without the double-tap follow-up.
    pub fn from_token(token: &str) -> Option<(Self, bool)> {
        let kind = Self::from_str(token).ok()?;
        let marked = token.chars().all(|c| c.is_ascii_uppercase());
        Some((kind, marked))
    }

    /// Name as passed to the dispatcher
    pub fn name(self) -> &'static str {
        match self {
            ModifierKind::Ctrl => "ctrl",
            ModifierKind::Alt => "alt",
            ModifierKind::Shift => "shift",
            ModifierKind::Super => "super",
        }
    }
}

/// One entry of the modifier stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeldModifier {
    pub kind: ModifierKind,
    pub marked: bool,
}

impl HeldModifier {
    pub fn new(kind: ModifierKind, marked: bool) -> Self {
        Self { kind, marked }
    }
}

impl fmt::Display for HeldModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.marked {
            write!(f, "{}", self.kind.name().to_ascii_uppercase())
        } else {
            write!(f, "{}", self.kind.name())
        }
    }
}
