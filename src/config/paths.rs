//! Where keyblocker keeps its config and logs: `dirs::config_dir()`
//! (`%APPDATA%`, `~/Library/Application Support`, `$XDG_CONFIG_HOME` or
//! `~/.config`) joined with `keyblocker`.

use std::path::PathBuf;

const APP_DIR: &str = "keyblocker";

/// Root directory for keyblocker's files.
pub fn get_app_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default directory for `keyblocker.log`.
pub fn get_log_dir() -> PathBuf {
    get_app_dir().join("logs")
}
