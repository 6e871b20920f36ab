//! Wire format of the control channel.
//!
//! One plaintext ASCII token per connection, matched exactly and
//! case-sensitively after trailing CR/LF are dropped. Recognized commands
//! are answered with `OK`; anything else gets no bytes back.

use crate::state::SuppressionState;

/// Largest request read from a connection.
pub const MAX_REQUEST_LEN: usize = 511;

/// Acknowledgment written for every recognized command.
pub const ACK: &[u8] = b"OK";

/// A recognized control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Block,
    Unblock,
}

impl ControlCommand {
    /// Parse a raw request. `None` for anything that is not exactly a
    /// known token.
    pub fn parse(request: &[u8]) -> Option<Self> {
        match trim_line_ending(request) {
            b"BLOCK" => Some(Self::Block),
            b"UNBLOCK" => Some(Self::Unblock),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::Unblock => "UNBLOCK",
        }
    }

    /// Suppression value this command sets.
    pub fn target_state(self) -> bool {
        matches!(self, Self::Block)
    }

    /// Write the command's value into `state`, returning the previous value.
    pub fn apply(self, state: &SuppressionState) -> bool {
        state.set(self.target_state())
    }
}

impl std::fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn trim_line_ending(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = bytes {
        bytes = rest;
    }
    bytes
}
