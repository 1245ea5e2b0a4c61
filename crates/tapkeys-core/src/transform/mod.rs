// Tapkeys Transform Engine
// Composition trie, mode resolution and the tap translator

pub mod mode;
pub mod translator;
pub mod trie;

pub use mode::resolve_mode_switch;
pub use translator::{TranslateError, Translator};
pub use trie::{ComposeConflict, CompositionTrie, NodeId};
