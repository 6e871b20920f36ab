//! Shared suppression flag.
//!
//! Written by the control channel thread, read by the keyboard hook
//! callback on the main thread. A single `AtomicBool` is enough: there is
//! exactly one value and no transition needs to be compare-and-set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether meta-key suppression is currently active.
#[derive(Debug, Default)]
pub struct SuppressionState {
    active: AtomicBool,
}

impl SuppressionState {
    /// New shared handle, inactive.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current value, as of the most recently completed `set`.
    pub fn get(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Replace the value and return the previous one.
    pub fn set(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::AcqRel)
    }
}

impl std::fmt::Display for SuppressionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.get() {
            write!(f, "blocking")
        } else {
            write!(f, "passthrough")
        }
    }
}
