// Tapkeys Event Handling
// Device connections and the tap events they deliver

pub mod connection;
#[cfg(unix)]
pub mod socket;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

pub use connection::{ConnectionConfig, ConnectionManager, DeviceSlot, SharedTranslator};
#[cfg(unix)]
pub use socket::{BridgeDevice, BridgeSocketBackend};

/// Errors that can occur talking to a device
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("Discovery failed in {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How a device reports gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum InputMode {
    /// Raw tap codes
    Controller,
    /// The device's own text output
    Text,
}

/// A connected tap device
pub trait TapDevice: Send {
    fn address(&self) -> &str;

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), DeviceError>;

    /// Returns false once the device stops answering within `timeout`
    fn is_connected(&mut self, timeout: Duration) -> bool;

    /// Tap codes received within `timeout`, in arrival order
    fn read_taps(&mut self, timeout: Duration) -> Result<Vec<usize>, DeviceError>;
}

/// Source of tap devices
pub trait DeviceBackend: Send + Sync {
    type Device: TapDevice;

    /// Addresses of devices that can be connected to now
    fn discover(&self) -> Result<Vec<String>, DeviceError>;

    /// Connect to `address`. `Ok(None)` means the device is not reachable yet.
    fn connect(&self, address: &str, timeout: Duration)
        -> Result<Option<Self::Device>, DeviceError>;
}

/// Receiver of device events. Called from one thread per device.
pub trait TapSink: Send + Sync {
    fn on_tap(&self, address: &str, tap_code: usize);

    fn on_connect(&self, _address: &str) {}

    fn on_disconnect(&self, _address: &str) {}
}
