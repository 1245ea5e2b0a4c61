// Tapkeys Bridge Socket Backend
// Tap devices relayed by a Bluetooth bridge over Unix sockets
//
// One socket per device, line oriented:
//   bridge -> client: decimal tap codes ("5\n")
//   client -> bridge: "mode controller\n" after connecting, "ping\n" for liveness

use std::io::{self, Read, Write};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DeviceBackend, DeviceError, InputMode, TapDevice};

/// Backend whose device addresses are bridge socket paths
#[derive(Debug, Clone)]
pub struct BridgeSocketBackend {
    discovery_dir: PathBuf,
}

impl BridgeSocketBackend {
    /// Discover sockets placed in `discovery_dir`
    pub fn new(discovery_dir: impl Into<PathBuf>) -> Self {
        Self {
            discovery_dir: discovery_dir.into(),
        }
    }

    pub fn discovery_dir(&self) -> &Path {
        &self.discovery_dir
    }
}

impl DeviceBackend for BridgeSocketBackend {
    type Device = BridgeDevice;

    fn discover(&self) -> Result<Vec<String>, DeviceError> {
        let entries = match std::fs::read_dir(&self.discovery_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(DeviceError::Discovery {
                    path: self.discovery_dir.clone(),
                    source,
                })
            }
        };

        let mut sockets = Vec::new();
        for entry in entries.flatten() {
            let is_socket = entry.file_type().map(|t| t.is_socket()).unwrap_or(false);
            if is_socket {
                sockets.push(entry.path().to_string_lossy().into_owned());
            }
        }
        sockets.sort();
        Ok(sockets)
    }

    fn connect(&self, address: &str, timeout: Duration) -> Result<Option<BridgeDevice>, DeviceError> {
        let stream = match UnixStream::connect(address) {
            Ok(stream) => stream,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };
        stream.set_write_timeout(Some(timeout))?;
        Ok(Some(BridgeDevice::new(address, stream)))
    }
}

/// One bridge connection
#[derive(Debug)]
pub struct BridgeDevice {
    address: String,
    stream: UnixStream,
    /// Bytes of an incomplete trailing line
    pending: Vec<u8>,
}

impl BridgeDevice {
    pub fn new(address: impl Into<String>, stream: UnixStream) -> Self {
        Self {
            address: address.into(),
            stream,
            pending: Vec::new(),
        }
    }

    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")
    }

    fn drain_lines(&mut self) -> Vec<usize> {
        let mut taps = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match text.parse::<usize>() {
                Ok(code) => taps.push(code),
                Err(_) => log::warn!("{}: ignoring unexpected line '{}'", self.address, text),
            }
        }
        taps
    }
}

impl TapDevice for BridgeDevice {
    fn address(&self) -> &str {
        &self.address
    }

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), DeviceError> {
        self.send_line(&format!("mode {}", mode))?;
        Ok(())
    }

    fn is_connected(&mut self, timeout: Duration) -> bool {
        if self.stream.set_write_timeout(Some(timeout)).is_err() {
            return false;
        }
        self.send_line("ping").is_ok()
    }

    fn read_taps(&mut self, timeout: Duration) -> Result<Vec<usize>, DeviceError> {
        // A zero duration is rejected by set_read_timeout
        let timeout = timeout.max(Duration::from_millis(1));
        self.stream.set_read_timeout(Some(timeout))?;

        let mut buf = [0u8; 256];
        match self.stream.read(&mut buf) {
            Ok(0) => return Err(DeviceError::Disconnected(self.address.clone())),
            Ok(n) => self.pending.extend_from_slice(&buf[..n]),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.drain_lines())
    }
}
