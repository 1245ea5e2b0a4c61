// Tapkeys Layout Loader
// Parses the comma-separated mode/slot table

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::action::KeyAction;
use crate::symbols::normalize_token;

/// Ordered actions bound to one (mode, tap code) pair
pub type SlotActions = SmallVec<[KeyAction; 2]>;

/// Layout loading errors
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("layout has no header row")]
    MissingHeader,

    #[error("layout header declares no modes")]
    NoModes,

    #[error("duplicate mode '{0}' in layout header")]
    DuplicateMode(String),

    #[error("line {line}: expected {expected} cells, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Static mode/slot table.
///
/// Mode names are stored lower-case in declaration order; the first one is
/// the base mode.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    modes: IndexMap<String, Vec<SlotActions>>,
}

impl LayoutTable {
    /// Load a layout from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a layout definition.
    ///
    /// The first column of every row is a label and is skipped. Blank lines
    /// are ignored.
    pub fn parse(content: &str) -> Result<Self, LayoutError> {
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header) = lines.next().ok_or(LayoutError::MissingHeader)?;

        let mut modes: IndexMap<String, Vec<SlotActions>> = IndexMap::new();
        for name in header.split(',').skip(1) {
            let name = name.trim().to_lowercase();
            if modes.contains_key(&name) {
                return Err(LayoutError::DuplicateMode(name));
            }
            modes.insert(name, Vec::new());
        }
        if modes.is_empty() {
            return Err(LayoutError::NoModes);
        }

        let expected = modes.len() + 1;
        let names: Vec<String> = modes.keys().cloned().collect();
        let mode_index = |token: &str| {
            let lowered = token.to_lowercase();
            names.iter().position(|name| *name == lowered)
        };

        for (line, row) in lines {
            let cells: Vec<&str> = row.split(',').collect();
            if cells.len() != expected {
                return Err(LayoutError::RowWidth {
                    line,
                    expected,
                    found: cells.len(),
                });
            }

            for (cell, slots) in cells[1..].iter().zip(modes.values_mut()) {
                let actions: SlotActions = cell
                    .split_whitespace()
                    .map(|raw| KeyAction::classify(normalize_token(raw), &mode_index))
                    .collect();
                slots.push(actions);
            }
        }

        log::debug!(
            "loaded layout with {} modes and {} slots",
            modes.len(),
            modes.first().map(|(_, slots)| slots.len()).unwrap_or(0)
        );

        Ok(Self { modes })
    }

    /// Declared mode names, in order
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(|name| name.as_str())
    }

    /// Number of declared modes
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Name of the mode at `index`
    pub fn mode_name(&self, index: usize) -> Option<&str> {
        self.modes.get_index(index).map(|(name, _)| name.as_str())
    }

    /// First declared mode
    pub fn base_mode(&self) -> &str {
        self.mode_name(0).unwrap_or_default()
    }

    /// Index of a mode, matched case-insensitively
    pub fn mode_index(&self, name: &str) -> Option<usize> {
        self.modes.get_index_of(name.to_lowercase().as_str())
    }

    /// Number of tap-code slots (equal for every mode)
    pub fn slot_count(&self) -> usize {
        self.modes.first().map(|(_, slots)| slots.len()).unwrap_or(0)
    }

    /// Number of slots declared for one mode
    pub fn slots_in_mode(&self, index: usize) -> Option<usize> {
        self.modes.get_index(index).map(|(_, slots)| slots.len())
    }

    /// Actions bound to `tap_code` (1-based) in the mode at `mode`
    pub fn slot(&self, mode: usize, tap_code: usize) -> Option<&[KeyAction]> {
        let (_, slots) = self.modes.get_index(mode)?;
        let index = tap_code.checked_sub(1)?;
        slots.get(index).map(|actions| actions.as_slice())
    }
}
