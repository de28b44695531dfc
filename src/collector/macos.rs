//! macOS implementation of event collection using CGEvent tap.
//!
//! Key presses and mouse button changes are observed through a listen-only
//! Core Graphics event tap. It requires Input Monitoring permission.

use crate::collector::types::{unknown_key, InputEvent, BUTTON_LEFT, BUTTON_MIDDLE, BUTTON_RIGHT};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, CallbackResult, EventField,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

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

/// The macOS event collector using CGEvent tap.
pub struct MacOSCollector {
    config: CollectorConfig,
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MacOSCollector {
    /// Create a new macOS collector with the given configuration.
    pub fn new(config: CollectorConfig) -> Self {
        // Bounded so a stalled consumer cannot grow memory without limit
        let (sender, receiver) = bounded(10_000);

        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start capturing events in a background thread.
    ///
    /// A missing Input Monitoring permission does not fail here: the tap
    /// creation fails on the capture thread, is logged, and the collector
    /// falls back to delivering nothing.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_event_loop(sender, running.clone(), config) {
                tracing::warn!("Input capture unavailable: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop capturing events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // The run loop wakes every 100ms and sees the flag
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

impl Drop for MacOSCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    TapCreationFailed,
    RunLoopSourceFailed,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::TapCreationFailed => {
                write!(f, "Failed to create CGEvent tap (is Input Monitoring granted?)")
            }
            CollectorError::RunLoopSourceFailed => {
                write!(f, "Failed to create run loop source")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

/// Build a list of event types to capture based on configuration.
fn build_event_types(config: &CollectorConfig) -> Vec<CGEventType> {
    let mut types = Vec::new();

    if config.capture_keyboard {
        types.push(CGEventType::KeyDown);
        types.push(CGEventType::FlagsChanged);
    }

    if config.capture_mouse {
        types.push(CGEventType::LeftMouseDown);
        types.push(CGEventType::LeftMouseUp);
        types.push(CGEventType::RightMouseDown);
        types.push(CGEventType::RightMouseUp);
        types.push(CGEventType::OtherMouseDown);
        types.push(CGEventType::OtherMouseUp);
    }

    types
}

/// Run the Core Graphics event loop.
fn run_event_loop(
    sender: Sender<InputEvent>,
    running: Arc<AtomicBool>,
    config: CollectorConfig,
) -> Result<(), CollectorError> {
    let event_types = build_event_types(&config);

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        event_types,
        move |_proxy, event_type, event| {
            if let Some(input) = process_cg_event(event_type, event) {
                // Never block the tap; a full channel drops the event
                let _ = sender.try_send(input);
            }
            CallbackResult::Keep
        },
    )
    .map_err(|_| CollectorError::TapCreationFailed)?;

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| CollectorError::RunLoopSourceFailed)?;

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }

    tap.enable();
    tracing::info!("Keyboard/mouse event tap installed");

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            std::time::Duration::from_millis(100),
            false,
        );
    }

    // The tap is disabled when dropped
    Ok(())
}

/// Convert a CGEvent into an input notification.
fn process_cg_event(event_type: CGEventType, event: &CGEvent) -> Option<InputEvent> {
    use core_graphics::event::CGEventType::*;

    match event_type {
        KeyDown => {
            let code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
            let shifted = event.get_flags().contains(CGEventFlags::CGEventFlagShift);
            Some(InputEvent::key(key_name(code, shifted)))
        }
        FlagsChanged => {
            // Fires for both press and release of a modifier; the flag for
            // that modifier is set only while it is held.
            let code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
            let flag = modifier_flag(code)?;
            if event.get_flags().contains(flag) {
                Some(InputEvent::key(key_name(code, false)))
            } else {
                None
            }
        }

        LeftMouseDown => Some(InputEvent::click(BUTTON_LEFT, true)),
        LeftMouseUp => Some(InputEvent::click(BUTTON_LEFT, false)),
        RightMouseDown => Some(InputEvent::click(BUTTON_RIGHT, true)),
        RightMouseUp => Some(InputEvent::click(BUTTON_RIGHT, false)),
        OtherMouseDown => Some(InputEvent::click(BUTTON_MIDDLE, true)),
        OtherMouseUp => Some(InputEvent::click(BUTTON_MIDDLE, false)),

        _ => None,
    }
}

fn modifier_flag(code: i64) -> Option<CGEventFlags> {
    match code {
        55 | 54 => Some(CGEventFlags::CGEventFlagCommand),
        56 | 60 => Some(CGEventFlags::CGEventFlagShift),
        57 => Some(CGEventFlags::CGEventFlagAlphaShift),
        58 | 61 => Some(CGEventFlags::CGEventFlagAlternate),
        59 | 62 => Some(CGEventFlags::CGEventFlagControl),
        63 => Some(CGEventFlags::CGEventFlagSecondaryFn),
        _ => None,
    }
}

/// Map an ANSI-layout virtual keycode to its recorded name.
fn key_name(code: i64, shifted: bool) -> String {
    let printable = match code {
        0 => 'a',
        1 => 's',
        2 => 'd',
        3 => 'f',
        4 => 'h',
        5 => 'g',
        6 => 'z',
        7 => 'x',
        8 => 'c',
        9 => 'v',
        11 => 'b',
        12 => 'q',
        13 => 'w',
        14 => 'e',
        15 => 'r',
        16 => 'y',
        17 => 't',
        18 => '1',
        19 => '2',
        20 => '3',
        21 => '4',
        22 => '6',
        23 => '5',
        24 => '=',
        25 => '9',
        26 => '7',
        27 => '-',
        28 => '8',
        29 => '0',
        30 => ']',
        31 => 'o',
        32 => 'u',
        33 => '[',
        34 => 'i',
        35 => 'p',
        37 => 'l',
        38 => 'j',
        39 => '\'',
        40 => 'k',
        41 => ';',
        42 => '\\',
        43 => ',',
        44 => '/',
        45 => 'n',
        46 => 'm',
        47 => '.',
        50 => '`',
        _ => return special_key_name(code),
    };

    if shifted && printable.is_ascii_alphabetic() {
        printable.to_ascii_uppercase().to_string()
    } else {
        printable.to_string()
    }
}

fn special_key_name(code: i64) -> String {
    let name = match code {
        36 => "enter",
        48 => "tab",
        49 => "space",
        51 => "backspace",
        53 => "esc",
        54 => "cmd_r",
        55 => "cmd",
        56 => "shift",
        57 => "caps_lock",
        58 => "alt",
        59 => "ctrl",
        60 => "shift_r",
        61 => "alt_r",
        62 => "ctrl_r",
        63 => "fn",
        96 => "f5",
        97 => "f6",
        98 => "f7",
        99 => "f3",
        100 => "f8",
        101 => "f9",
        103 => "f11",
        109 => "f10",
        111 => "f12",
        115 => "home",
        116 => "page_up",
        117 => "delete",
        118 => "f4",
        119 => "end",
        120 => "f2",
        121 => "page_down",
        122 => "f1",
        123 => "left",
        124 => "right",
        125 => "down",
        126 => "up",
        _ => return unknown_key(code as u32),
    };
    name.to_string()
}

/// Check if the application has Input Monitoring permission.
///
/// macOS has no direct query for this; creating a passive tap fails when
/// permission is missing.
pub fn check_permission() -> bool {
    let result = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    );

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = MacOSCollector::new(CollectorConfig::default());
        assert!(!collector.is_running());
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(0, false), "a");
        assert_eq!(key_name(0, true), "A");
        assert_eq!(key_name(18, true), "1");
        assert_eq!(key_name(49, false), "space");
        assert_eq!(key_name(126, false), "up");
        assert_eq!(key_name(200, false), "<200>");
    }

    #[test]
    fn test_event_types_follow_config() {
        let config = CollectorConfig {
            capture_keyboard: false,
            capture_mouse: true,
        };
        let types = build_event_types(&config);
        assert!(!types.iter().any(|t| matches!(t, CGEventType::KeyDown)));
        assert!(types.iter().any(|t| matches!(t, CGEventType::LeftMouseDown)));
    }
}
