use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "keyblocker";

/// Keeps the background log writers alive. Dropping it flushes and stops
/// them, so the host holds it until exit.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    _console: WorkerGuard,
}

/// Timestamps records with a monotonic millisecond counter: milliseconds
/// since boot on Windows, since process start elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootClock;

impl FormatTime for BootClock {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", millis_since_boot())
    }
}

#[cfg(target_os = "windows")]
pub fn millis_since_boot() -> u64 {
    unsafe { windows::Win32::System::SystemInformation::GetTickCount64() }
}

#[cfg(not(target_os = "windows"))]
pub fn millis_since_boot() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u64
}

/// Initialize the structured logging system.
///
/// Sets up:
/// - File output: append-only `{log_dir}/keyblocker.log`, never rotated.
/// - Console output (stderr): compact format for development.
/// - Environment filter: `RUST_LOG` if set, else `default_filter`.
///
/// Both outputs go through `tracing_appender::non_blocking`, so emitting a
/// record from the keyboard hook never waits on disk or console I/O. If the
/// log file cannot be opened, logging continues on the console only.
pub fn init(log_dir: &Path, default_filter: &str) -> anyhow::Result<LogGuard> {
    // Pin the process-start origin before the first record.
    let _ = millis_since_boot();

    let (console_writer, console_guard) = tracing_appender::non_blocking(std::io::stderr());
    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_ansi(true)
        .with_target(true)
        .with_timer(BootClock)
        .compact();

    let (file_layer, file_guard, file_error) = match open_log_file(log_dir) {
        Ok(appender) => {
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_timer(BootClock);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("tracing subscriber already set")?;

    match file_error {
        None => tracing::info!(log_dir = %log_dir.display(), "Logger initialized"),
        Some(e) => tracing::warn!("Log file unavailable, console only: {:#}", e),
    }

    Ok(LogGuard {
        _file: file_guard,
        _console: console_guard,
    })
}

fn open_log_file(log_dir: &Path) -> anyhow::Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("opening log file in {}", log_dir.display()))
}
