// Tapkeys Output Layer
// Dispatchers that turn output actions into OS input events

mod dispatcher;
mod xdotool;

#[cfg(feature = "uinput")]
mod uinput;

pub use dispatcher::{DispatchError, Dispatcher, LogDispatcher, RecordingDispatcher};
pub use xdotool::XdotoolDispatcher;

#[cfg(feature = "uinput")]
pub use uinput::VirtualDevice;
