// Tapkeys Mode Resolution
// Target mode for the `mode` action given the held modifiers

use crate::modifier::{HeldModifier, ModifierKind};

/// Index of the mode selected by a `mode` action.
///
/// Modes are counted from the first one after the base mode. Ctrl and alt
/// each skip two further modes, so the table is:
///
/// | held         | target |
/// |--------------|--------|
/// | none         | 1      |
/// | ctrl         | 3      |
/// | alt          | 3      |
/// | ctrl + alt   | 5      |
///
/// Ctrl alone and alt alone land on the same mode. Only unmarked modifiers
/// count. Returns `None` when the target is past the declared modes.
pub fn resolve_mode_switch(mode_count: usize, held: &[HeldModifier]) -> Option<usize> {
    let is_held = |kind: ModifierKind| held.iter().any(|m| m.kind == kind && !m.marked);

    let mut target = 1;
    if is_held(ModifierKind::Ctrl) {
        target += 2;
    }
    if is_held(ModifierKind::Alt) {
        target += 2;
    }

    (target < mode_count).then_some(target)
}
