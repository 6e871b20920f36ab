//! Optional JSON configuration.
//!
//! Every field is optional; a missing file means defaults. The listener
//! host is not configurable and always the loopback address.
//!
//! Loading happens before the log subscriber exists (the config names the
//! log directory), so problems are returned in `LoadedConfig::warnings`
//! instead of being logged here.

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::server::{ControlSettings, DEFAULT_PORT, DEFAULT_READ_TIMEOUT};

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "KEYBLOCKER_CONFIG";

/// Environment variable overriding the control port. `keyblock-ctl` reads
/// the same variable.
pub const PORT_ENV: &str = "KEYBLOCKER_PORT";

const DEFAULT_LOG_FILTER: &str = "info";

/// `config.json` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBlockerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT.as_millis() as u64
}

impl Default for KeyBlockerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
            log_dir: None,
            log_filter: None,
        }
    }
}

impl KeyBlockerConfig {
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            port: self.port,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(paths::get_log_dir)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// Effective configuration plus anything that went wrong producing it.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: KeyBlockerConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Apply a `KEYBLOCKER_PORT` value. Unparseable values are reported
    /// and leave the port alone.
    pub fn apply_port_override(&mut self, raw: &str) {
        match raw.trim().parse::<u16>() {
            Ok(port) => self.config.port = port,
            Err(e) => self
                .warnings
                .push(format!("Ignoring {}={:?}: {}", PORT_ENV, raw, e)),
        }
    }
}

/// Path to the config file, honoring `KEYBLOCKER_CONFIG`.
pub fn get_config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths::get_app_dir().join("config.json"))
}

/// Read the config file and environment overrides, falling back to
/// defaults.
pub fn read_config() -> LoadedConfig {
    let mut loaded = read_config_from(&get_config_path());
    if let Ok(port) = std::env::var(PORT_ENV) {
        loaded.apply_port_override(&port);
    }
    loaded
}

pub fn read_config_from(path: &Path) -> LoadedConfig {
    match read_json_file(path) {
        Ok(config) => LoadedConfig {
            config: config.unwrap_or_default(),
            warnings: Vec::new(),
        },
        Err(warning) => LoadedConfig {
            config: KeyBlockerConfig::default(),
            warnings: vec![warning],
        },
    }
}

/// `Ok(None)` when the file does not exist.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
    }
}
