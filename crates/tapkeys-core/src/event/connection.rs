// Tapkeys Connection Manager
// Keeps every configured device connected and forwards its taps

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

use super::{DeviceBackend, DeviceError, InputMode, TapDevice, TapSink};
use crate::output::Dispatcher;
use crate::transform::Translator;

/// Connection timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Minimum time between liveness checks, also the read and retry interval
    pub poll_interval: Duration,
    pub liveness_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            liveness_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

/// Connection state for one device address
pub struct DeviceSlot<T> {
    address: String,
    device: Option<T>,
    last_check: Option<Instant>,
}

impl<T: TapDevice> DeviceSlot<T> {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            device: None,
            last_check: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    /// Advance the slot once: connect if disconnected, otherwise check
    /// liveness (at most once per poll interval) and deliver pending taps.
    ///
    /// Returns whether the device is connected afterwards.
    pub fn step<B>(&mut self, backend: &B, config: &ConnectionConfig, sink: &dyn TapSink) -> bool
    where
        B: DeviceBackend<Device = T>,
    {
        match self.device.take() {
            None => self.connect(backend, config, sink),
            Some(device) => self.service(device, config, sink),
        }
        self.device.is_some()
    }

    fn connect<B>(&mut self, backend: &B, config: &ConnectionConfig, sink: &dyn TapSink)
    where
        B: DeviceBackend<Device = T>,
    {
        let mut device = match backend.connect(&self.address, config.connect_timeout) {
            Ok(Some(device)) => device,
            Ok(None) => {
                log::debug!("{} not reachable", self.address);
                return;
            }
            Err(e) => {
                log::warn!("failed to connect to {}: {}", self.address, e);
                return;
            }
        };

        if let Err(e) = device.set_input_mode(InputMode::Controller) {
            log::warn!("failed to set input mode on {}: {}", self.address, e);
            return;
        }

        log::info!("connected to {}", self.address);
        self.last_check = Some(Instant::now());
        self.device = Some(device);
        sink.on_connect(&self.address);
    }

    fn service(&mut self, mut device: T, config: &ConnectionConfig, sink: &dyn TapSink) {
        let due = self
            .last_check
            .map_or(true, |at| at.elapsed() >= config.poll_interval);
        if due {
            self.last_check = Some(Instant::now());
            if !device.is_connected(config.liveness_timeout) {
                log::info!("{} stopped responding", self.address);
                sink.on_disconnect(&self.address);
                return;
            }
        }

        match device.read_taps(config.poll_interval) {
            Ok(taps) => {
                for tap_code in taps {
                    sink.on_tap(&self.address, tap_code);
                }
                self.device = Some(device);
            }
            Err(e) => {
                log::info!("lost {}: {}", self.address, e);
                sink.on_disconnect(&self.address);
            }
        }
    }
}

/// Runs one connection thread per device address
pub struct ConnectionManager<B> {
    backend: Arc<B>,
    addresses: Vec<String>,
    config: ConnectionConfig,
    running: Arc<AtomicBool>,
}

impl<B: DeviceBackend + 'static> ConnectionManager<B> {
    /// Manage `addresses`. An empty list is filled by discovery when run.
    pub fn new(backend: B, addresses: Vec<String>, config: ConnectionConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            addresses,
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag that keeps the manager running; store `false` to stop it
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Retry discovery every poll interval until a device shows up or the
    /// manager is stopped.
    pub fn discover(&self) -> Vec<String> {
        while self.running.load(Ordering::SeqCst) {
            match self.backend.discover() {
                Ok(found) if !found.is_empty() => {
                    log::info!("discovered {} device(s): {}", found.len(), found.join(", "));
                    return found;
                }
                Ok(_) => log::debug!("no devices found, retrying"),
                Err(e) => log::warn!("device discovery failed: {}", e),
            }
            thread::sleep(self.config.poll_interval);
        }
        Vec::new()
    }

    /// Connect to every device and deliver taps to `sink` until stopped.
    pub fn run(&mut self, sink: Arc<dyn TapSink>) -> Result<(), DeviceError> {
        if self.addresses.is_empty() {
            self.addresses = self.discover();
        }

        let mut handles = Vec::with_capacity(self.addresses.len());
        for address in &self.addresses {
            let backend = Arc::clone(&self.backend);
            let config = self.config.clone();
            let running = Arc::clone(&self.running);
            let sink = Arc::clone(&sink);
            let mut slot = DeviceSlot::<B::Device>::new(address.clone());

            let handle = thread::Builder::new()
                .name(format!("tap {}", address))
                .spawn(move || {
                    while running.load(Ordering::SeqCst) {
                        if !slot.step(backend.as_ref(), &config, sink.as_ref()) {
                            thread::sleep(config.poll_interval);
                        }
                    }
                    if slot.is_connected() {
                        sink.on_disconnect(slot.address());
                    }
                })?;
            handles.push(handle);
        }

        for handle in handles {
            if handle.join().is_err() {
                log::error!("device thread panicked");
            }
        }
        Ok(())
    }
}

/// Translator shared by all device threads. Taps are translated one at a
/// time under a single lock.
pub struct SharedTranslator<D>(Arc<Mutex<Translator<D>>>);

impl<D> Clone for SharedTranslator<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D: Dispatcher> SharedTranslator<D> {
    pub fn new(translator: Translator<D>) -> Self {
        Self(Arc::new(Mutex::new(translator)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Translator<D>> {
        self.0.lock()
    }
}

impl<D: Dispatcher> TapSink for SharedTranslator<D> {
    fn on_tap(&self, address: &str, tap_code: usize) {
        if let Err(e) = self.0.lock().on_tap(tap_code) {
            log::warn!("{}: {}", address, e);
        }
    }
}
