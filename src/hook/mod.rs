//! Global low-level keyboard hook that swallows the Windows keys.
//!
//! The suppression decision is platform-independent and lives here; the
//! platform backends only translate raw hook arguments into a `KeyEvent`,
//! ask the registered `KeyInterceptor`, and report the verdict to the OS.
//!
//! Platform backends:
//! - Windows: `WH_KEYBOARD_LL` via the `windows` crate
//! - elsewhere: installation reports `HookError::Unsupported`

#[cfg(not(target_os = "windows"))]
mod fallback;
#[cfg(target_os = "windows")]
mod win32;

#[cfg(not(target_os = "windows"))]
pub use fallback::{install, run_message_loop, uninstall};
#[cfg(target_os = "windows")]
pub use win32::{install, run_message_loop, uninstall};

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::error::HookError;
use crate::state::SuppressionState;

/// Left Windows key.
pub const VK_LWIN: u32 = 0x5B;
/// Right Windows key.
pub const VK_RWIN: u32 = 0x5C;

// Low-level hook message identifiers (the hook's wParam).
const WM_KEYDOWN: u32 = 0x0100;
const WM_KEYUP: u32 = 0x0101;
const WM_SYSKEYDOWN: u32 = 0x0104;
const WM_SYSKEYUP: u32 = 0x0105;

/// Press/release class of a low-level key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    KeyDown,
    KeyUp,
    /// Key-down while Alt is held (or F10 / Alt itself).
    SysKeyDown,
    SysKeyUp,
}

impl Transition {
    /// Map a hook message identifier. Unknown identifiers yield `None`.
    pub fn from_message(msg: u32) -> Option<Self> {
        match msg {
            WM_KEYDOWN => Some(Self::KeyDown),
            WM_KEYUP => Some(Self::KeyUp),
            WM_SYSKEYDOWN => Some(Self::SysKeyDown),
            WM_SYSKEYUP => Some(Self::SysKeyUp),
            _ => None,
        }
    }

    pub fn is_press(self) -> bool {
        matches!(self, Self::KeyDown | Self::SysKeyDown)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyDown => write!(f, "keydown"),
            Self::KeyUp => write!(f, "keyup"),
            Self::SysKeyDown => write!(f, "syskeydown"),
            Self::SysKeyUp => write!(f, "syskeyup"),
        }
    }
}

/// One observed keyboard event. Only lives for the duration of a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub vk_code: u32,
    pub transition: Transition,
}

impl KeyEvent {
    pub fn new(vk_code: u32, transition: Transition) -> Self {
        Self {
            vk_code,
            transition,
        }
    }
}

/// What the hook tells the OS to do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the event to the next hook in the chain.
    Forward,
    /// Consume the event; nothing downstream sees it.
    Suppress,
}

/// True for the two keys this tool blocks.
pub fn is_meta_key(vk_code: u32) -> bool {
    vk_code == VK_LWIN || vk_code == VK_RWIN
}

/// Handler registered with the OS hook. Holds the shared suppression flag.
///
/// `on_key` runs on the OS input path for every key event on the host, so
/// it does one atomic load, a couple of comparisons and, when it swallows a
/// key, emits one log record to the non-blocking writer.
#[derive(Debug, Clone)]
pub struct KeyInterceptor {
    state: Arc<SuppressionState>,
}

impl KeyInterceptor {
    pub fn new(state: Arc<SuppressionState>) -> Self {
        Self { state }
    }

    /// Pure suppression decision for one event.
    pub fn decide(&self, event: KeyEvent) -> Verdict {
        if self.state.get() && is_meta_key(event.vk_code) && event.transition.is_press() {
            Verdict::Suppress
        } else {
            Verdict::Forward
        }
    }

    /// Decide and record the suppression, if any.
    pub fn on_key(&self, event: KeyEvent) -> Verdict {
        let verdict = self.decide(event);
        if verdict == Verdict::Suppress {
            info!(
                vk = format_args!("{:#04X}", event.vk_code),
                transition = %event.transition,
                "Blocked Windows key"
            );
        }
        verdict
    }
}

/// Fill the process-wide interceptor slot around an OS registration.
///
/// The slot is only filled once `install_os` has succeeded, so a refused
/// registration can be retried. If another caller won the slot meanwhile,
/// the fresh registration is rolled back with `undo`.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn register_with<T>(
    slot: &OnceLock<KeyInterceptor>,
    interceptor: KeyInterceptor,
    install_os: impl FnOnce() -> Result<T, HookError>,
    undo: impl FnOnce(T),
) -> Result<T, HookError> {
    if slot.get().is_some() {
        return Err(HookError::AlreadyInstalled);
    }
    let handle = install_os()?;
    if slot.set(interceptor).is_err() {
        undo(handle);
        return Err(HookError::AlreadyInstalled);
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CapturedLogs;

    const ALL_TRANSITIONS: [Transition; 4] = [
        Transition::KeyDown,
        Transition::KeyUp,
        Transition::SysKeyDown,
        Transition::SysKeyUp,
    ];

    fn interceptor(active: bool) -> KeyInterceptor {
        let state = SuppressionState::new();
        state.set(active);
        KeyInterceptor::new(state)
    }

    #[test]
    fn maps_hook_messages() {
        assert_eq!(Transition::from_message(0x0100), Some(Transition::KeyDown));
        assert_eq!(Transition::from_message(0x0101), Some(Transition::KeyUp));
        assert_eq!(Transition::from_message(0x0104), Some(Transition::SysKeyDown));
        assert_eq!(Transition::from_message(0x0105), Some(Transition::SysKeyUp));
        assert_eq!(Transition::from_message(0x0200), None);
    }

    #[test]
    fn only_down_transitions_are_presses() {
        assert!(Transition::KeyDown.is_press());
        assert!(Transition::SysKeyDown.is_press());
        assert!(!Transition::KeyUp.is_press());
        assert!(!Transition::SysKeyUp.is_press());
    }

    #[test]
    fn inactive_forwards_everything() {
        let hook = interceptor(false);
        for vk in 0..=0xFFu32 {
            for t in ALL_TRANSITIONS {
                assert_eq!(hook.decide(KeyEvent::new(vk, t)), Verdict::Forward);
            }
        }
    }

    #[test]
    fn active_suppresses_only_meta_presses() {
        let hook = interceptor(true);
        for vk in 0..=0xFFu32 {
            for t in ALL_TRANSITIONS {
                let expected = if is_meta_key(vk) && t.is_press() {
                    Verdict::Suppress
                } else {
                    Verdict::Forward
                };
                assert_eq!(hook.decide(KeyEvent::new(vk, t)), expected, "vk={vk:#x} {t}");
            }
        }
    }

    #[test]
    fn meta_key_up_is_forwarded_while_active() {
        let hook = interceptor(true);
        assert_eq!(
            hook.on_key(KeyEvent::new(VK_LWIN, Transition::KeyUp)),
            Verdict::Forward
        );
        assert_eq!(
            hook.on_key(KeyEvent::new(VK_RWIN, Transition::SysKeyUp)),
            Verdict::Forward
        );
    }

    #[test]
    fn toggling_state_changes_following_decisions() {
        let state = SuppressionState::new();
        let hook = KeyInterceptor::new(state.clone());
        let lwin_down = KeyEvent::new(VK_LWIN, Transition::KeyDown);

        assert_eq!(hook.on_key(lwin_down), Verdict::Forward);
        state.set(true);
        assert_eq!(hook.on_key(lwin_down), Verdict::Suppress);
        state.set(false);
        assert_eq!(hook.on_key(lwin_down), Verdict::Forward);
    }

    #[test]
    fn suppressed_press_is_logged_once() {
        let logs = CapturedLogs::default();
        let hook = interceptor(true);
        tracing::subscriber::with_default(logs.subscriber(), || {
            hook.on_key(KeyEvent::new(VK_LWIN, Transition::KeyDown));
            hook.on_key(KeyEvent::new(VK_LWIN, Transition::KeyUp));
            hook.on_key(KeyEvent::new(0x41, Transition::KeyDown));
        });
        assert_eq!(logs.count("Blocked Windows key"), 1, "{}", logs.contents());
        assert!(logs.contents().contains("vk=0x5B"));
        assert!(logs.contents().contains("transition=keydown"));
    }

    #[test]
    fn forwarded_events_are_not_logged() {
        let logs = CapturedLogs::default();
        let hook = interceptor(false);
        tracing::subscriber::with_default(logs.subscriber(), || {
            for t in ALL_TRANSITIONS {
                hook.on_key(KeyEvent::new(VK_LWIN, t));
                hook.on_key(KeyEvent::new(VK_RWIN, t));
            }
        });
        assert_eq!(logs.count("Blocked Windows key"), 0);
    }

    #[test]
    fn refused_registration_leaves_slot_free() {
        let slot = OnceLock::new();
        let refused = register_with(
            &slot,
            interceptor(false),
            || Err::<(), _>(HookError::InstallFailed("access denied".into())),
            |_| unreachable!(),
        );
        assert!(matches!(refused, Err(HookError::InstallFailed(_))));
        assert!(slot.get().is_none());

        assert_eq!(register_with(&slot, interceptor(false), || Ok(7), |_| {}).ok(), Some(7));
        assert!(slot.get().is_some());
    }

    #[test]
    fn second_registration_is_rejected_without_touching_os() {
        let slot = OnceLock::new();
        register_with(&slot, interceptor(false), || Ok(()), |_| {}).unwrap();

        let mut called = false;
        let again = register_with(
            &slot,
            interceptor(true),
            || {
                called = true;
                Ok(())
            },
            |_| {},
        );
        assert!(matches!(again, Err(HookError::AlreadyInstalled)));
        assert!(!called);
    }
}
