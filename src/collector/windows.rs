//! Windows implementation of event collection using low-level hooks.
//!
//! `WH_KEYBOARD_LL` and `WH_MOUSE_LL` are installed on a dedicated thread
//! that pumps messages until [`WindowsCollector::stop`] posts `WM_QUIT`.

use crate::collector::types::{
    capture_available, unknown_key, InputEvent, BUTTON_LEFT, BUTTON_MIDDLE, BUTTON_RIGHT,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_SHIFT};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, PeekMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL,
    WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_QUIT,
    WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SYSKEYDOWN, WM_USER,
};

/// Configuration for which event sources to capture.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub capture_keyboard: bool,
    pub capture_mouse: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capture_keyboard: true,
            capture_mouse: true,
        }
    }
}

/// The Windows event collector using Windows Hooks.
pub struct WindowsCollector {
    config: CollectorConfig,
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    running: Arc<AtomicBool>,
    hook_thread_id: AtomicU32,
    thread_handle: Option<JoinHandle<()>>,
}

impl WindowsCollector {
    /// Create a new Windows collector with the given configuration.
    pub fn new(config: CollectorConfig) -> Self {
        // Bounded so a stalled consumer cannot grow memory without limit
        let (sender, receiver) = bounded(10_000);

        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            hook_thread_id: AtomicU32::new(0),
            thread_handle: None,
        }
    }

    /// Start capturing events in a background thread.
    ///
    /// Returns an error if the collector is already running. Hook
    /// installation failures are logged from the hook thread.
    ///
    /// Returns once the hook thread has a message queue, so a following
    /// [`stop`](Self::stop) always reaches it.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();
        let (ready_tx, ready_rx) = bounded(1);

        let handle = thread::spawn(move || {
            // The first message call creates the queue WM_QUIT is posted to
            let mut msg = MSG::default();
            unsafe {
                let _ = PeekMessageW(&mut msg, HWND::default(), WM_USER, WM_USER, PM_NOREMOVE);
            }
            let _ = ready_tx.send(unsafe { GetCurrentThreadId() });

            if let Err(e) = run_hook_loop(sender, running.clone(), config) {
                tracing::warn!("Input capture unavailable: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        if let Ok(thread_id) = ready_rx.recv() {
            self.hook_thread_id.store(thread_id, Ordering::SeqCst);
        }
        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop capturing events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let thread_id = self.hook_thread_id.swap(0, Ordering::SeqCst);
        if thread_id != 0 {
            // GetMessageW blocks; wake it so the loop can exit
            let _ = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for input notifications.
    pub fn receiver(&self) -> &Receiver<InputEvent> {
        &self.receiver
    }

    /// Sending half of the notification channel.
    pub fn sender(&self) -> Sender<InputEvent> {
        self.sender.clone()
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<InputEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for WindowsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    HookInstallationFailed,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::HookInstallationFailed => {
                write!(f, "Failed to install Windows hook")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

// Hook procedures are plain functions; the sender lives in the hook
// thread's local storage.
thread_local! {
    static EVENT_SENDER: std::cell::RefCell<Option<Sender<InputEvent>>> = const { std::cell::RefCell::new(None) };
}

fn send(event: InputEvent) {
    EVENT_SENDER.with(|sender| {
        if let Some(ref s) = *sender.borrow() {
            let _ = s.try_send(event);
        }
    });
}

/// Low-level keyboard hook callback.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 && matches!(w_param.0 as u32, WM_KEYDOWN | WM_SYSKEYDOWN) {
        let kb_struct = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let shifted = GetAsyncKeyState(VK_SHIFT.0 as i32) < 0;
        send(InputEvent::key(key_name(kb_struct.vkCode, shifted)));
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

/// Low-level mouse hook callback.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 {
        let event = match w_param.0 as u32 {
            WM_LBUTTONDOWN => Some(InputEvent::click(BUTTON_LEFT, true)),
            WM_LBUTTONUP => Some(InputEvent::click(BUTTON_LEFT, false)),
            WM_RBUTTONDOWN => Some(InputEvent::click(BUTTON_RIGHT, true)),
            WM_RBUTTONUP => Some(InputEvent::click(BUTTON_RIGHT, false)),
            WM_MBUTTONDOWN => Some(InputEvent::click(BUTTON_MIDDLE, true)),
            WM_MBUTTONUP => Some(InputEvent::click(BUTTON_MIDDLE, false)),
            _ => None,
        };

        if let Some(event) = event {
            send(event);
        }
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

/// Run the Windows hook message loop.
fn run_hook_loop(
    sender: Sender<InputEvent>,
    running: Arc<AtomicBool>,
    config: CollectorConfig,
) -> Result<(), CollectorError> {
    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });

    let mut hooks: Vec<HHOOK> = Vec::new();
    let mut attempts = Vec::new();

    unsafe {
        if config.capture_keyboard {
            let hook = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0).ok();
            attempts.push(("keyboard", hook.is_some()));
            hooks.extend(hook);
        }

        if config.capture_mouse {
            let hook = SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0).ok();
            attempts.push(("mouse", hook.is_some()));
            hooks.extend(hook);
        }

        if !capture_available(&attempts) {
            return Err(CollectorError::HookInstallationFailed);
        }

        tracing::info!("Installed {} low-level input hook(s)", hooks.len());

        // The hooks run while this thread pumps messages
        let mut msg = MSG::default();
        while running.load(Ordering::SeqCst) {
            let result = GetMessageW(&mut msg, HWND::default(), 0, 0);
            if result.0 <= 0 {
                // WM_QUIT or error
                break;
            }
        }

        unhook_all(hooks);
    }

    Ok(())
}

unsafe fn unhook_all(hooks: Vec<HHOOK>) {
    for hook in hooks {
        let _ = UnhookWindowsHookEx(hook);
    }
}

/// Map a virtual-key code to its recorded name.
fn key_name(vk: u32, shifted: bool) -> String {
    match vk {
        0x41..=0x5A => {
            let c = (vk as u8) as char;
            if shifted {
                c.to_string()
            } else {
                c.to_ascii_lowercase().to_string()
            }
        }
        0x30..=0x39 => ((vk as u8) as char).to_string(),
        0x70..=0x7B => format!("f{}", vk - 0x6F),
        _ => special_key_name(vk),
    }
}

fn special_key_name(vk: u32) -> String {
    let name = match vk {
        0x08 => "backspace",
        0x09 => "tab",
        0x0D => "enter",
        0x10 | 0xA0 => "shift",
        0xA1 => "shift_r",
        0x11 | 0xA2 => "ctrl",
        0xA3 => "ctrl_r",
        0x12 | 0xA4 => "alt",
        0xA5 => "alt_r",
        0x14 => "caps_lock",
        0x1B => "esc",
        0x20 => "space",
        0x21 => "page_up",
        0x22 => "page_down",
        0x23 => "end",
        0x24 => "home",
        0x25 => "left",
        0x26 => "up",
        0x27 => "right",
        0x28 => "down",
        0x2E => "delete",
        0x5B => "cmd",
        0x5C => "cmd_r",
        0xBA => ";",
        0xBB => "=",
        0xBC => ",",
        0xBD => "-",
        0xBE => ".",
        0xBF => "/",
        0xC0 => "`",
        0xDB => "[",
        0xDC => "\\",
        0xDD => "]",
        0xDE => "'",
        _ => return unknown_key(vk),
    };
    name.to_string()
}

/// Check if the application can install low-level hooks.
///
/// Installs a temporary keyboard hook and removes it again.
pub fn check_permission() -> bool {
    unsafe {
        match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
            Ok(hook) => {
                let _ = UnhookWindowsHookEx(hook);
                true
            }
            Err(_) => false,
        }
    }
}
