//! `keyblock-ctl`: send one command to a running keyblocker.
//!
//! Exit status: 0 when acknowledged, 2 when the server closed without an
//! acknowledgment, 1 when the server could not be reached.

use std::net::{Ipv4Addr, SocketAddr};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use keyblocker_lib::config::PORT_ENV;
use keyblocker_lib::control::client::{send_command, Reply};
use keyblocker_lib::control::{ControlCommand, DEFAULT_PORT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    Block,
    Unblock,
}

impl From<Action> for ControlCommand {
    fn from(action: Action) -> Self {
        match action {
            Action::Block => ControlCommand::Block,
            Action::Unblock => ControlCommand::Unblock,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "keyblock-ctl", about = "Toggle Windows-key blocking on a running keyblocker")]
struct Cli {
    /// Command to send.
    #[arg(value_enum, required_unless_present = "raw")]
    action: Option<Action>,

    /// Send this token verbatim instead of a known command.
    #[arg(long, conflicts_with = "action")]
    raw: Option<String>,

    /// Control port on 127.0.0.1. The host honors the same variable.
    #[arg(long, env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Give up after this many milliseconds.
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,
}

impl Cli {
    fn request(&self) -> Vec<u8> {
        match (&self.raw, self.action) {
            (Some(raw), _) => raw.as_bytes().to_vec(),
            (None, Some(action)) => ControlCommand::from(action).as_str().as_bytes().to_vec(),
            (None, None) => Vec::new(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, cli.port));
    let request = cli.request();

    match send_command(addr, &request, Duration::from_millis(cli.timeout_ms)).await {
        Ok(Reply::Acknowledged) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        Ok(Reply::Closed) => {
            eprintln!("keyblock-ctl: request not recognized (connection closed)");
            ExitCode::from(2)
        }
        Ok(Reply::Unexpected(bytes)) => {
            eprintln!(
                "keyblock-ctl: unexpected reply {:?}",
                String::from_utf8_lossy(&bytes)
            );
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("keyblock-ctl: {}: {}", addr, e);
            ExitCode::FAILURE
        }
    }
}
