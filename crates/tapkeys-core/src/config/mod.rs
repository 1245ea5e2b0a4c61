// Tapkeys Config Loading
// Layout table and compose definitions

pub mod compose;
pub mod layout;

pub use compose::{load_compose, parse_compose, parse_compose_line, ComposeEntry, ComposeError, DEFAULT_TRIGGER};
pub use layout::{LayoutError, LayoutTable, SlotActions};
