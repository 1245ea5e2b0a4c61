// Tapkeys Settings Module
// Optional user settings: file locations, composition trigger, timeouts, output backend

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::DEFAULT_TRIGGER;
use crate::event::ConnectionConfig;

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// Dispatcher used to deliver output actions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputBackend {
    /// Shell out to xdotool (X11)
    #[default]
    Xdotool,
    /// Linux uinput virtual keyboard (needs the `uinput` feature)
    Uinput,
    /// Log actions only
    Log,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    #[serde(default)]
    paths: PathSettings,
    #[serde(default)]
    compose: ComposeSettings,
    #[serde(default)]
    connection: ConnectionSettings,
    #[serde(default)]
    output: OutputSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathSettings {
    layout: Option<PathBuf>,
    xcompose: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComposeSettings {
    trigger: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionSettings {
    poll_interval_ms: Option<u64>,
    liveness_timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    discovery_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSettings {
    backend: Option<OutputBackend>,
}

/// User settings loaded from `settings.toml`.
///
/// Every value is optional; callers fall back to built-in defaults and
/// command-line flags take precedence over anything set here.
#[derive(Debug, Clone)]
pub struct Settings {
    layout_path: Option<PathBuf>,
    compose_path: Option<PathBuf>,
    compose_trigger: String,
    connection: ConnectionConfig,
    discovery_dir: Option<PathBuf>,
    output: OutputBackend,
    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Settings with every value at its default
    pub fn new() -> Self {
        Self {
            layout_path: None,
            compose_path: None,
            compose_trigger: DEFAULT_TRIGGER.to_string(),
            connection: ConnectionConfig::default(),
            discovery_dir: None,
            output: OutputBackend::default(),
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let raw: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();
        settings.layout_path = raw.paths.layout;
        settings.compose_path = raw.paths.xcompose;

        if let Some(trigger) = raw.compose.trigger {
            if trigger.trim().is_empty() || trigger.contains(['<', '>']) {
                return Err(SettingsError::InvalidValue(format!(
                    "compose.trigger must be a bare keysym name, got '{}'",
                    trigger
                )));
            }
            settings.compose_trigger = trigger;
        }

        let conn = raw.connection;
        if let Some(ms) = conn.poll_interval_ms {
            settings.connection.poll_interval = positive_millis("poll_interval_ms", ms)?;
        }
        if let Some(ms) = conn.liveness_timeout_ms {
            settings.connection.liveness_timeout = positive_millis("liveness_timeout_ms", ms)?;
        }
        if let Some(ms) = conn.connect_timeout_ms {
            settings.connection.connect_timeout = positive_millis("connect_timeout_ms", ms)?;
        }
        settings.discovery_dir = conn.discovery_dir;

        if let Some(backend) = raw.output.backend {
            settings.output = backend;
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tapkeys").join("settings.toml"))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// Layout file used when none is given on the command line
    pub fn layout_path(&self) -> PathBuf {
        self.layout_path
            .clone()
            .unwrap_or_else(Self::default_layout_path)
    }

    /// Compose file used when none is given on the command line
    pub fn compose_path(&self) -> PathBuf {
        self.compose_path
            .clone()
            .unwrap_or_else(Self::default_compose_path)
    }

    pub fn compose_trigger(&self) -> &str {
        &self.compose_trigger
    }

    pub fn output_backend(&self) -> OutputBackend {
        self.output
    }

    /// Directory scanned for bridge sockets when no address is given
    pub fn discovery_dir(&self) -> PathBuf {
        self.discovery_dir
            .clone()
            .unwrap_or_else(Self::default_discovery_dir)
    }

    /// Connection timing
    pub fn connection_config(&self) -> ConnectionConfig {
        self.connection.clone()
    }

    /// Get the source path of the settings file
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Built-in layout location (`<config_dir>/tapstrap/layout.csv`)
    pub fn default_layout_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("tapstrap")
            .join("layout.csv")
    }

    /// Built-in compose location (`~/.XCompose`)
    pub fn default_compose_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".XCompose")
    }

    /// Built-in bridge socket directory (`$XDG_RUNTIME_DIR/tapkeys`)
    pub fn default_discovery_dir() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("tapkeys")
    }
}

fn positive_millis(name: &str, ms: u64) -> Result<Duration, SettingsError> {
    if ms == 0 {
        return Err(SettingsError::InvalidValue(format!(
            "connection.{} must be greater than zero",
            name
        )));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_settings() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.compose_trigger(), "Multi_key");
        assert_eq!(settings.output_backend(), OutputBackend::Xdotool);
        assert_eq!(settings.connection_config(), ConnectionConfig::default());
        assert_eq!(settings.layout_path(), Settings::default_layout_path());
        assert!(settings.layout_path().ends_with("tapstrap/layout.csv"));
        assert!(settings.compose_path().ends_with(".XCompose"));
    }

    #[test]
    fn test_full_settings() {
        let toml = r#"
[paths]
layout = "/etc/tapkeys/layout.csv"
xcompose = "/etc/tapkeys/XCompose"

[compose]
trigger = "dead_acute"

[connection]
poll_interval_ms = 250
liveness_timeout_ms = 500
connect_timeout_ms = 2000
discovery_dir = "/run/tapkeys"

[output]
backend = "log"
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.layout_path(), PathBuf::from("/etc/tapkeys/layout.csv"));
        assert_eq!(settings.compose_path(), PathBuf::from("/etc/tapkeys/XCompose"));
        assert_eq!(settings.compose_trigger(), "dead_acute");
        assert_eq!(settings.discovery_dir(), PathBuf::from("/run/tapkeys"));
        assert_eq!(settings.output_backend(), OutputBackend::Log);

        let conn = settings.connection_config();
        assert_eq!(conn.poll_interval, Duration::from_millis(250));
        assert_eq!(conn.liveness_timeout, Duration::from_millis(500));
        assert_eq!(conn.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            Settings::from_toml("[paths]\nlayuot = \"x\"\n"),
            Err(SettingsError::TomlParse(_))
        ));
        assert!(matches!(
            Settings::from_toml("[extra]\n"),
            Err(SettingsError::TomlParse(_))
        ));
        assert!(matches!(
            Settings::from_toml("[output]\nbackend = \"wayland\"\n"),
            Err(SettingsError::TomlParse(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Settings::from_toml("[connection]\npoll_interval_ms = 0\n"),
            Err(SettingsError::InvalidValue(_))
        ));
        assert!(matches!(
            Settings::from_toml("[compose]\ntrigger = \"<Multi_key>\"\n"),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_output_backend_names() {
        assert_eq!(OutputBackend::Uinput.to_string(), "uinput");
        assert_eq!("xdotool".parse::<OutputBackend>().unwrap(), OutputBackend::Xdotool);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nbackend = \"uinput\"").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.output_backend(), OutputBackend::Uinput);
        assert_eq!(settings.source_path(), Some(file.path()));

        assert!(matches!(
            Settings::from_file("/nonexistent/settings.toml"),
            Err(SettingsError::Io(_))
        ));
    }
}
