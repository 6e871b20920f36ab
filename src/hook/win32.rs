//! `WH_KEYBOARD_LL` backend.
//!
//! The hook procedure is a bare `extern "system"` function, so the
//! registered `KeyInterceptor` and the hook handle live in write-once
//! statics set by `install`. Low-level hooks are delivered through the
//! installing thread's message queue: the thread that calls `install` must
//! also call `run_message_loop`.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::OnceLock;

use tracing::{error, info, warn};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, SetWindowsHookExW, TranslateMessage,
    UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL,
};

use super::{register_with, KeyEvent, KeyInterceptor, Transition, Verdict};
use crate::error::HookError;

static INTERCEPTOR: OnceLock<KeyInterceptor> = OnceLock::new();
static HOOK_HANDLE: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

unsafe extern "system" fn low_level_keyboard_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let hook = HHOOK(HOOK_HANDLE.load(Ordering::Acquire));

    // Negative codes must be passed on untouched.
    if code >= 0 {
        if let (Some(interceptor), Some(transition)) =
            (INTERCEPTOR.get(), Transition::from_message(wparam.0 as u32))
        {
            let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
            let event = KeyEvent::new(info.vkCode, transition);
            if interceptor.on_key(event) == Verdict::Suppress {
                return LRESULT(1);
            }
        }
    }

    CallNextHookEx(hook, code, wparam, lparam)
}

/// Register `interceptor` as the process-wide low-level keyboard hook.
pub fn install(interceptor: KeyInterceptor) -> Result<(), HookError> {
    let hook = register_with(&INTERCEPTOR, interceptor, set_hook, |hook| unsafe {
        let _ = UnhookWindowsHookEx(hook);
    })?;

    HOOK_HANDLE.store(hook.0, Ordering::Release);
    info!(handle = ?hook.0, "WH_KEYBOARD_LL installed");
    Ok(())
}

fn set_hook() -> Result<HHOOK, HookError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| HookError::InstallFailed(e.message().to_string()))?;
        SetWindowsHookExW(
            WH_KEYBOARD_LL,
            Some(low_level_keyboard_proc),
            HINSTANCE(module.0),
            0,
        )
        .map_err(|e| HookError::InstallFailed(e.message().to_string()))
    }
}

/// Remove the hook installed by `install`, if any.
pub fn uninstall() {
    let raw = HOOK_HANDLE.swap(ptr::null_mut(), Ordering::AcqRel);
    if raw.is_null() {
        return;
    }
    match unsafe { UnhookWindowsHookEx(HHOOK(raw)) } {
        Ok(()) => info!("Keyboard hook removed"),
        Err(e) => warn!("Failed to remove keyboard hook: {}", e.message()),
    }
}

/// Pump this thread's message queue until `WM_QUIT` or a pump failure.
pub fn run_message_loop() {
    let mut msg = MSG::default();
    loop {
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        match ret.0 {
            0 => {
                info!("WM_QUIT received, leaving message loop");
                break;
            }
            -1 => {
                error!("GetMessageW failed, leaving message loop");
                break;
            }
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
}
