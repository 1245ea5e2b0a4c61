// Tapkeys Translator
// Stateful tap-code to key-action engine
//
// Each tap looks up the actions bound to the current mode and applies them
// in order:
// - mode actions change the current mode and keep held modifiers
// - modifier actions toggle sticky modifiers (double taps have follow-ups)
// - character actions are typed (or fed to composition), then every held
//   modifier is released and an unlocked mode reverts to the base mode

use crate::action::{KeyAction, OutputAction, CAPS_LOCK, COMPOSE, ENTER, RESET, SET};
use crate::config::layout::{LayoutTable, SlotActions};
use crate::modifier::{HeldModifier, ModifierKind};
use crate::output::Dispatcher;
use crate::transform::mode::resolve_mode_switch;
use crate::transform::trie::{CompositionTrie, NodeId};

/// Errors for a single tap. State changes made before the error are kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("tap code {code} out of range (layout has {slots} slots)")]
    TapCodeOutOfRange { code: usize, slots: usize },

    #[error("no mode to switch to with [{held}] held ({modes} modes declared)")]
    ModeOutOfRange { held: String, modes: usize },
}

/// Translation engine. One instance serves every connected device.
pub struct Translator<D> {
    layout: LayoutTable,
    trie: CompositionTrie,
    dispatcher: D,
    mode: usize,
    locked: bool,
    stack: Vec<HeldModifier>,
    composing: Option<NodeId>,
    caps_lock: bool,
}

impl<D: Dispatcher> Translator<D> {
    /// Create a translator in the base mode with nothing held
    pub fn new(layout: LayoutTable, trie: CompositionTrie, dispatcher: D) -> Self {
        Self {
            layout,
            trie,
            dispatcher,
            mode: 0,
            locked: false,
            stack: Vec::new(),
            composing: None,
            caps_lock: false,
        }
    }

    /// Process one tap
    pub fn on_tap(&mut self, tap_code: usize) -> Result<(), TranslateError> {
        let actions: SlotActions = self
            .layout
            .slot(self.mode, tap_code)
            .ok_or(TranslateError::TapCodeOutOfRange {
                code: tap_code,
                slots: self.layout.slot_count(),
            })?
            .iter()
            .cloned()
            .collect();

        log::debug!(
            "mode={} tap={} stack=[{}] actions=[{}]",
            self.mode_name(),
            tap_code,
            self.stack_display(),
            actions
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        );

        for action in actions {
            self.apply(action)?;
        }
        Ok(())
    }

    fn apply(&mut self, action: KeyAction) -> Result<(), TranslateError> {
        let button = match action {
            KeyAction::ModeSwitch => {
                let target = resolve_mode_switch(self.layout.mode_count(), &self.stack).ok_or_else(
                    || TranslateError::ModeOutOfRange {
                        held: self.stack_display(),
                        modes: self.layout.mode_count(),
                    },
                )?;
                self.set_mode(target, false);
                None
            }
            KeyAction::Mode { index, locked } => {
                self.set_mode(index, locked);
                None
            }
            KeyAction::Modifier(held) => self.press(held.kind, held.marked),
            other => Some(other),
        };

        if let Some(button) = button {
            match self.composing {
                Some(node) => self.compose(node, &button),
                None => self.tap(&button),
            }
            self.clear_stack();
        }
        Ok(())
    }

    /// Toggle a sticky modifier. Returns the follow-up action of a double tap.
    fn press(&mut self, kind: ModifierKind, marked: bool) -> Option<KeyAction> {
        if let Some(pos) = self.position(kind, false) {
            self.stack.remove(pos);
            self.emit(OutputAction::Release(kind));
            match kind {
                ModifierKind::Shift => self.press(ModifierKind::Alt, false),
                ModifierKind::Ctrl => Some(KeyAction::Special(ENTER.to_string())),
                ModifierKind::Alt => Some(KeyAction::Special(RESET.to_string())),
                ModifierKind::Super => {
                    self.caps_lock = !self.caps_lock;
                    Some(KeyAction::Special(CAPS_LOCK.to_string()))
                }
            }
        } else if let Some(pos) = self.position(kind, true) {
            self.stack.remove(pos);
            self.emit(OutputAction::Release(kind));
            None
        } else {
            self.stack.push(HeldModifier::new(kind, marked));
            self.emit(OutputAction::Hold(kind));
            None
        }
    }

    fn compose(&mut self, node: NodeId, action: &KeyAction) {
        let Some(token) = action.token() else {
            return;
        };

        let child = if self.caps_lock {
            self.trie
                .child(node, &token.to_uppercase())
                .or_else(|| self.trie.child(node, token))
        } else {
            self.trie.child(node, token)
        };

        match child {
            Some(next) => match self.trie.leaf(next) {
                Some(symbol) => {
                    let symbol = symbol.to_string();
                    self.composing = None;
                    self.emit(OutputAction::Type(symbol));
                }
                None => self.composing = Some(next),
            },
            None => {
                log::debug!("composition aborted at {}", token);
                self.composing = None;
                self.tap(action);
            }
        }
    }

    fn tap(&mut self, action: &KeyAction) {
        match action {
            KeyAction::Special(name) if name == SET => self.toggle_lock(),
            KeyAction::Special(name) if name == COMPOSE => {
                if self.is_held(ModifierKind::Ctrl) {
                    self.emit(OutputAction::press(ENTER));
                } else if !self.trie.is_empty() {
                    self.composing = Some(self.trie.root());
                }
            }
            KeyAction::Special(name) if name == RESET => {}
            KeyAction::Character(text) => self.emit(OutputAction::Type(text.clone())),
            KeyAction::Special(name) => self.emit(OutputAction::Press(name.clone())),
            // Mode and modifier actions are resolved before dispatch
            KeyAction::ModeSwitch | KeyAction::Mode { .. } | KeyAction::Modifier(_) => {}
        }
    }

    fn toggle_lock(&mut self) {
        if self.locked {
            self.set_mode(0, false);
        } else {
            self.locked = true;
        }
    }

    fn clear_stack(&mut self) {
        for held in std::mem::take(&mut self.stack) {
            self.emit(OutputAction::Release(held.kind));
        }
        if !self.locked {
            self.mode = 0;
        }
    }

    fn set_mode(&mut self, index: usize, locked: bool) {
        self.mode = index;
        self.locked = locked;
    }

    fn emit(&mut self, action: OutputAction) {
        if let Err(e) = self.dispatcher.dispatch(&action) {
            log::warn!("failed to dispatch '{}': {}", action, e);
        }
    }

    /// Release everything, leave composition and return to the base mode.
    /// Caps lock is kept.
    pub fn reset(&mut self) {
        self.composing = None;
        self.locked = false;
        self.clear_stack();
    }
}

impl<D> Translator<D> {
    fn position(&self, kind: ModifierKind, marked: bool) -> Option<usize> {
        self.stack
            .iter()
            .position(|m| m.kind == kind && m.marked == marked)
    }

    fn stack_display(&self) -> String {
        self.stack
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if the unmarked form of `kind` is held
    pub fn is_held(&self, kind: ModifierKind) -> bool {
        self.position(kind, false).is_some()
    }

    /// Current mode name, upper-cased when locked
    pub fn mode_name(&self) -> String {
        let name = self.layout.mode_name(self.mode).unwrap_or_default();
        if self.locked {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    /// Index of the current mode
    pub fn mode_index(&self) -> usize {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Held modifiers in press order
    pub fn held_modifiers(&self) -> &[HeldModifier] {
        &self.stack
    }

    pub fn is_composing(&self) -> bool {
        self.composing.is_some()
    }

    pub fn caps_lock(&self) -> bool {
        self.caps_lock
    }

    pub fn layout(&self) -> &LayoutTable {
        &self.layout
    }

    pub fn trie(&self) -> &CompositionTrie {
        &self.trie
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn into_dispatcher(self) -> D {
        self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingDispatcher;

    const LAYOUT: &str = "\
tap,abc,num,sym,fn,nav,emo
1,a,1,!,F1,Left,x
2,b,2,@,F2,Right,y
3,mode,mode,mode,mode,mode,mode
4,ctrl,ctrl,ctrl,ctrl,ctrl,ctrl
5,alt,alt,alt,alt,alt,alt
6,shift,shift,shift,shift,shift,shift
7,super,super,super,super,super,super
8,set,set,set,set,set,set
9,compose,compose,compose,compose,compose,compose
10,CTRL,CTRL,CTRL,CTRL,CTRL,CTRL
11,ctrl c,ctrl c,ctrl c,ctrl c,ctrl c,ctrl c
12,NUM,abc,abc,abc,abc,abc
13,;,;,;,;,;,;
";

    fn translator() -> Translator<RecordingDispatcher> {
        let layout = LayoutTable::parse(LAYOUT).unwrap();
        let mut trie = CompositionTrie::new();
        trie.insert(&["a", "b"], "â").unwrap();
        trie.insert(&["semicolon", "a"], "ä").unwrap();
        trie.insert(&["semicolon", "A"], "Ä").unwrap();
        Translator::new(layout, trie, RecordingDispatcher::new())
    }

    fn tap(t: &mut Translator<RecordingDispatcher>, codes: &[usize]) -> Vec<OutputAction> {
        for &code in codes {
            t.on_tap(code).unwrap();
        }
        t.dispatcher_mut().take()
    }

    fn release(kind: ModifierKind) -> OutputAction {
        OutputAction::Release(kind)
    }

    #[test]
    fn test_character_is_typed() {
        let mut t = translator();
        assert_eq!(tap(&mut t, &[1]), vec![OutputAction::type_text("a")]);
        assert_eq!(tap(&mut t, &[13]), vec![OutputAction::press("semicolon")]);
    }

    #[test]
    fn test_sticky_modifier_applies_to_next_character() {
        let mut t = translator();
        let out = tap(&mut t, &[4, 1]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Ctrl),
                OutputAction::type_text("a"),
                release(ModifierKind::Ctrl),
            ]
        );
        assert!(t.held_modifiers().is_empty());
    }

    #[test]
    fn test_multi_action_slot() {
        let mut t = translator();
        assert_eq!(
            tap(&mut t, &[11]),
            vec![
                OutputAction::Hold(ModifierKind::Ctrl),
                OutputAction::type_text("c"),
                release(ModifierKind::Ctrl),
            ]
        );
    }

    #[test]
    fn test_double_ctrl_sends_enter() {
        let mut t = translator();
        let out = tap(&mut t, &[4, 4]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Ctrl),
                release(ModifierKind::Ctrl),
                OutputAction::press("enter"),
            ]
        );
        assert!(t.held_modifiers().is_empty());
    }

    #[test]
    fn test_double_alt_resets() {
        let mut t = translator();
        let out = tap(&mut t, &[4, 5, 5]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Ctrl),
                OutputAction::Hold(ModifierKind::Alt),
                release(ModifierKind::Alt),
                release(ModifierKind::Ctrl),
            ]
        );
        assert!(t.held_modifiers().is_empty());
    }

    #[test]
    fn test_double_shift_holds_alt() {
        let mut t = translator();
        let out = tap(&mut t, &[6, 6]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Shift),
                release(ModifierKind::Shift),
                OutputAction::Hold(ModifierKind::Alt),
            ]
        );
        assert_eq!(
            t.held_modifiers(),
            &[HeldModifier::new(ModifierKind::Alt, false)]
        );
    }

    #[test]
    fn test_double_shift_with_alt_held_resets() {
        let mut t = translator();
        let out = tap(&mut t, &[5, 6, 6]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Alt),
                OutputAction::Hold(ModifierKind::Shift),
                release(ModifierKind::Shift),
                release(ModifierKind::Alt),
            ]
        );
        assert!(t.held_modifiers().is_empty());
    }

    #[test]
    fn test_double_super_toggles_caps_lock() {
        let mut t = translator();
        let out = tap(&mut t, &[7, 7]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Super),
                release(ModifierKind::Super),
                OutputAction::press("Caps_Lock"),
            ]
        );
        assert!(t.caps_lock());
        assert!(t.held_modifiers().is_empty());

        tap(&mut t, &[7, 7]);
        assert!(!t.caps_lock());
    }

    #[test]
    fn test_marked_modifier_releases_without_follow_up() {
        let mut t = translator();
        let out = tap(&mut t, &[10, 10]);
        assert_eq!(
            out,
            vec![OutputAction::Hold(ModifierKind::Ctrl), release(ModifierKind::Ctrl)]
        );

        // The unmarked token also releases the marked entry
        let out = tap(&mut t, &[10, 4]);
        assert_eq!(
            out,
            vec![OutputAction::Hold(ModifierKind::Ctrl), release(ModifierKind::Ctrl)]
        );
        assert!(t.held_modifiers().is_empty());
    }

    #[test]
    fn test_mode_switch_resolution() {
        let mut t = translator();
        tap(&mut t, &[3]);
        assert_eq!(t.mode_name(), "num");

        let mut t = translator();
        tap(&mut t, &[4, 3]);
        assert_eq!(t.mode_name(), "fn");
        // Mode switches keep modifiers held
        assert!(t.is_held(ModifierKind::Ctrl));

        let mut t = translator();
        tap(&mut t, &[5, 3]);
        assert_eq!(t.mode_name(), "fn");

        let mut t = translator();
        tap(&mut t, &[4, 5, 3]);
        assert_eq!(t.mode_name(), "emo");
    }

    #[test]
    fn test_mode_switch_past_declared_modes() {
        let layout = LayoutTable::parse("tap,abc,num\n1,mode,mode\n2,ctrl,ctrl\n").unwrap();
        let mut t = Translator::new(layout, CompositionTrie::new(), RecordingDispatcher::new());
        t.on_tap(2).unwrap();
        assert!(matches!(t.on_tap(1), Err(TranslateError::ModeOutOfRange { modes: 2, .. })));
        assert_eq!(t.mode_name(), "abc");
    }

    #[test]
    fn test_unlocked_mode_reverts_after_character() {
        let mut t = translator();
        let out = tap(&mut t, &[3, 1]);
        assert_eq!(out, vec![OutputAction::type_text("1")]);
        assert_eq!(t.mode_name(), "abc");
    }

    #[test]
    fn test_locked_mode_persists() {
        let mut t = translator();
        tap(&mut t, &[3, 8]);
        assert_eq!(t.mode_name(), "NUM");
        assert!(t.is_locked());

        assert_eq!(tap(&mut t, &[1, 2]), vec![
            OutputAction::type_text("1"),
            OutputAction::type_text("2"),
        ]);
        assert_eq!(t.mode_name(), "NUM");

        tap(&mut t, &[8]);
        assert_eq!(t.mode_name(), "abc");
        assert!(!t.is_locked());
    }

    #[test]
    fn test_direct_mode_token() {
        let mut t = translator();
        tap(&mut t, &[12]);
        assert_eq!(t.mode_name(), "NUM");
        tap(&mut t, &[1]);
        assert_eq!(t.mode_name(), "NUM");
        tap(&mut t, &[12]);
        assert_eq!(t.mode_name(), "abc");
        assert!(!t.is_locked());
    }

    #[test]
    fn test_composition() {
        let mut t = translator();
        let out = tap(&mut t, &[9]);
        assert!(out.is_empty());
        assert!(t.is_composing());

        assert!(tap(&mut t, &[1]).is_empty());
        assert!(t.is_composing());

        assert_eq!(tap(&mut t, &[2]), vec![OutputAction::type_text("â")]);
        assert!(!t.is_composing());
    }

    #[test]
    fn test_composition_abort_dispatches_literally() {
        let mut t = translator();
        tap(&mut t, &[9]);
        assert_eq!(tap(&mut t, &[2]), vec![OutputAction::type_text("b")]);
        assert!(!t.is_composing());
    }

    #[test]
    fn test_composition_with_caps_lock_prefers_upper_case() {
        let mut t = translator();
        tap(&mut t, &[7, 7]);
        assert!(t.caps_lock());
        tap(&mut t, &[9, 13]);
        assert_eq!(tap(&mut t, &[1]), vec![OutputAction::type_text("Ä")]);

        // Falls back to the key as typed when no upper-case child exists
        tap(&mut t, &[9]);
        assert_eq!(tap(&mut t, &[1, 2]), vec![OutputAction::type_text("â")]);
    }

    #[test]
    fn test_ctrl_compose_sends_enter() {
        let mut t = translator();
        let out = tap(&mut t, &[4, 9]);
        assert_eq!(
            out,
            vec![
                OutputAction::Hold(ModifierKind::Ctrl),
                OutputAction::press("enter"),
                release(ModifierKind::Ctrl),
            ]
        );
        assert!(!t.is_composing());
    }

    #[test]
    fn test_compose_with_empty_trie_is_a_no_op() {
        let layout = LayoutTable::parse(LAYOUT).unwrap();
        let mut t = Translator::new(layout, CompositionTrie::new(), RecordingDispatcher::new());
        t.on_tap(9).unwrap();
        assert!(!t.is_composing());
        t.on_tap(1).unwrap();
        assert_eq!(t.dispatcher().actions(), &[OutputAction::type_text("a")]);
    }

    #[test]
    fn test_tap_code_out_of_range() {
        let mut t = translator();
        assert_eq!(
            t.on_tap(0),
            Err(TranslateError::TapCodeOutOfRange { code: 0, slots: 13 })
        );
        assert!(t.on_tap(14).is_err());
        assert!(t.dispatcher().actions().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut t = translator();
        tap(&mut t, &[4, 5, 3, 8, 9]);
        t.reset();
        assert!(t.held_modifiers().is_empty());
        assert!(!t.is_composing());
        assert_eq!(t.mode_name(), "abc");
    }
}
