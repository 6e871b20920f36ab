//! Local control channel: `BLOCK` / `UNBLOCK` over loopback TCP.

pub mod client;
pub mod protocol;
pub mod server;

pub use protocol::ControlCommand;
pub use server::{spawn_control_channel, ControlServer, ControlSettings, DEFAULT_PORT};
