// Tapkeys CLI
// Translates taps from connected tap devices into keyboard input

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tapkeys_core::{
    load_compose, BridgeSocketBackend, ConnectionManager, Dispatcher, LayoutTable, LogDispatcher,
    OutputBackend, Settings, SharedTranslator, TapSink, Translator, XdotoolDispatcher,
};

#[cfg(feature = "uinput")]
use tapkeys_core::VirtualDevice;

/// Tap device to keyboard translator
#[derive(Parser, Debug)]
#[command(name = "tapkeys")]
#[command(version)]
#[command(about = "Translate tap device gestures into key presses", long_about = None)]
struct Args {
    /// Device addresses to connect to, comma separated (discovered if omitted)
    #[arg(
        long,
        alias = "bluetooth_addresses",
        value_name = "ADDRESSES",
        value_delimiter = ','
    )]
    bluetooth_addresses: Vec<String>,

    /// Layout definition (CSV)
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,

    /// Compose definition (XCompose format)
    #[arg(long, value_name = "PATH")]
    xcompose: Option<PathBuf>,

    /// Print the process id and wait for Enter before starting
    #[arg(long)]
    debug: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Layout and compose files to load: command line first, then settings
fn resolve_paths(args: &Args, settings: &Settings) -> (PathBuf, PathBuf) {
    let layout = args
        .layout
        .clone()
        .unwrap_or_else(|| settings.layout_path());
    let xcompose = args
        .xcompose
        .clone()
        .unwrap_or_else(|| settings.compose_path());
    (layout, xcompose)
}

fn build_dispatcher(backend: OutputBackend) -> anyhow::Result<Box<dyn Dispatcher>> {
    match backend {
        OutputBackend::Xdotool => Ok(Box::new(XdotoolDispatcher::new())),
        OutputBackend::Log => Ok(Box::new(LogDispatcher)),
        #[cfg(feature = "uinput")]
        OutputBackend::Uinput => Ok(Box::new(
            VirtualDevice::new().context("failed to create virtual keyboard")?,
        )),
        #[cfg(not(feature = "uinput"))]
        OutputBackend::Uinput => {
            anyhow::bail!("the uinput backend requires building with --features uinput")
        }
    }
}

/// Prints connection changes and forwards taps to the translator
struct ConsoleSink {
    translator: SharedTranslator<Box<dyn Dispatcher>>,
}

impl TapSink for ConsoleSink {
    fn on_tap(&self, address: &str, tap_code: usize) {
        self.translator.on_tap(address, tap_code);
    }

    fn on_connect(&self, address: &str) {
        println!("+ {}", address);
    }

    fn on_disconnect(&self, address: &str) {
        println!("- {}", address);
    }
}

fn load_settings() -> Settings {
    match Settings::load_default() {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("ignoring settings file: {}", e);
            Settings::new()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.debug {
        println!("PID: {}", std::process::id());
        println!("Press Enter to continue");
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
    }

    let settings = load_settings();
    let (layout_path, compose_path) = resolve_paths(&args, &settings);

    let layout = LayoutTable::from_path(&layout_path)
        .with_context(|| format!("failed to load layout {}", layout_path.display()))?;
    let trie = load_compose(&compose_path, settings.compose_trigger())
        .with_context(|| format!("failed to load compose file {}", compose_path.display()))?;
    log::info!(
        "{} modes, {} slots, {} compose sequences",
        layout.mode_count(),
        layout.slot_count(),
        trie.len()
    );

    let dispatcher = build_dispatcher(settings.output_backend())?;
    let translator = SharedTranslator::new(Translator::new(layout, trie, dispatcher));
    let sink = Arc::new(ConsoleSink { translator });

    let backend = BridgeSocketBackend::new(settings.discovery_dir());
    let mut manager = ConnectionManager::new(
        backend,
        args.bluetooth_addresses.clone(),
        settings.connection_config(),
    );
    manager.run(sink).context("connection manager failed")?;
    Ok(())
}
