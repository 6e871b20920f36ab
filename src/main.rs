//! keyblocker host process.
//!
//! Installs the keyboard hook on the main thread, starts the control
//! channel on its own thread, then pumps the main thread's message queue
//! so the hook keeps receiving events.

use std::process::ExitCode;

use tracing::{error, info, warn};

use keyblocker_lib::config::{read_config, LoadedConfig};
use keyblocker_lib::control::spawn_control_channel;
use keyblocker_lib::hook::{self, KeyInterceptor};
use keyblocker_lib::logger;
use keyblocker_lib::state::SuppressionState;

/// Exit status when the keyboard hook cannot be installed.
const EXIT_HOOK_FAILED: u8 = 1;

fn main() -> ExitCode {
    let LoadedConfig { config, warnings } = read_config();
    let _log_guard = match logger::init(&config.log_dir(), config.log_filter()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("keyblocker: logging unavailable: {:#}", e);
            None
        }
    };

    info!(?config, "KeyBlocker starting");
    for warning in &warnings {
        warn!("{}; using defaults", warning);
    }

    let state = SuppressionState::new();

    if let Err(e) = hook::install(KeyInterceptor::new(state.clone())) {
        error!("Failed to install keyboard hook: {}", e);
        return ExitCode::from(EXIT_HOOK_FAILED);
    }
    info!("Keyboard hook installed successfully");

    // Fire-and-forget: the handle is dropped, the thread is never joined.
    if let Err(e) = spawn_control_channel(config.control_settings(), state) {
        warn!("Failed to spawn control channel thread: {}", e);
    }

    hook::run_message_loop();

    hook::uninstall();
    info!("KeyBlocker exiting");
    ExitCode::SUCCESS
}
