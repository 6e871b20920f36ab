//! Error types for the two long-lived components.
//!
//! Neither error ever crosses into the other component: the host turns a
//! `HookError` into an exit status, and the control thread logs a
//! `ControlError` and ends.

use std::net::SocketAddr;

/// Failures installing the low-level keyboard hook.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A hook is already registered by this process.
    #[error("keyboard hook already installed")]
    AlreadyInstalled,

    /// The OS refused the hook (privileges, saturated hook chain, ...).
    #[error("failed to install keyboard hook: {0}")]
    InstallFailed(String),

    /// No low-level keyboard hook exists on this platform.
    #[error("low-level keyboard hooks are not supported on this platform")]
    Unsupported,
}

/// Failures that stop the control channel listener.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The listener could not bind (port in use, address unavailable).
    #[error("failed to bind control listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
