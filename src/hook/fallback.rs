//! Non-Windows builds: no low-level keyboard hook is available.
//!
//! The decision logic and the control channel still build and run; only
//! registration is refused, which makes the host exit at startup.

use tracing::warn;

use super::KeyInterceptor;
use crate::error::HookError;

pub fn install(_interceptor: KeyInterceptor) -> Result<(), HookError> {
    warn!("Low-level keyboard hook not available on this platform");
    Err(HookError::Unsupported)
}

pub fn uninstall() {}

/// Never returns; there is no message queue to pump.
pub fn run_message_loop() {
    loop {
        std::thread::park();
    }
}
