// Tapkeys Core Library
// Tap-code translation engine: layouts, composition, sticky modifiers

pub mod action;
pub mod config;
pub mod event;
pub mod key;
pub mod modifier;
pub mod output;
pub mod settings;
pub mod symbols;
pub mod transform;

pub use action::{KeyAction, OutputAction};
pub use config::{load_compose, parse_compose, ComposeError, LayoutError, LayoutTable};
pub use event::{
    ConnectionConfig, ConnectionManager, DeviceBackend, DeviceError, DeviceSlot, InputMode,
    SharedTranslator, TapDevice, TapSink,
};
#[cfg(unix)]
pub use event::{BridgeDevice, BridgeSocketBackend};
pub use key::Key;
pub use modifier::{HeldModifier, ModifierKind};
pub use output::{
    DispatchError, Dispatcher, LogDispatcher, RecordingDispatcher, XdotoolDispatcher,
};
pub use settings::{OutputBackend, Settings, SettingsError};
pub use transform::{
    resolve_mode_switch, ComposeConflict, CompositionTrie, NodeId, TranslateError, Translator,
};

#[cfg(feature = "uinput")]
pub use output::VirtualDevice;
