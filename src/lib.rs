//! keyblocker: swallow the Windows keys on demand.
//!
//! A global low-level keyboard hook consults a shared suppression flag; a
//! loopback TCP listener flips the flag with `BLOCK` / `UNBLOCK`.

pub mod config;
pub mod control;
pub mod error;
pub mod hook;
pub mod logger;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
