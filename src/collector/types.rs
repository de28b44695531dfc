//! Raw input notifications delivered by the platform collectors.
//!
//! These are the un-enriched callbacks of the input hook: no timestamp, no
//! application. The recorder adds both when it turns them into events.

use serde::{Deserialize, Serialize};

/// Mouse button names as recorded in session files.
pub const BUTTON_LEFT: &str = "left";
pub const BUTTON_RIGHT: &str = "right";
pub const BUTTON_MIDDLE: &str = "middle";

/// A raw notification from the input hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A key went down. Every key notification is treated as a press.
    Key { key: String },
    /// A mouse button changed state.
    Click { button: String, pressed: bool },
}

impl InputEvent {
    pub fn key(key: impl Into<String>) -> Self {
        InputEvent::Key { key: key.into() }
    }

    pub fn click(button: impl Into<String>, pressed: bool) -> Self {
        InputEvent::Click {
            button: button.into(),
            pressed,
        }
    }

    /// Whether the recorder should act on this notification.
    ///
    /// Button releases are ignored so that one physical click is one event.
    pub fn is_press(&self) -> bool {
        match self {
            InputEvent::Key { .. } => true,
            InputEvent::Click { pressed, .. } => *pressed,
        }
    }
}

/// Name for a key that has no printable character.
///
/// Shared by the platform collectors so both produce the same vocabulary.
pub fn unknown_key(code: u32) -> String {
    format!("<{code}>")
}

/// Whether capture can go on after subscribing to each requested source.
///
/// `attempts` pairs a source name with whether its subscription succeeded.
/// Each failure is logged; capture continues while at least one source works.
pub fn capture_available(attempts: &[(&str, bool)]) -> bool {
    for (source, _) in attempts.iter().filter(|(_, ok)| !ok) {
        tracing::warn!("Could not subscribe to {source} input; continuing without it");
    }
    attempts.is_empty() || attempts.iter().any(|(_, ok)| *ok)
}
