//! Recorded events and the sessions that own them.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Column names of a session file, in order.
pub const CSV_HEADER: [&str; 4] = ["timestamp", "app", "event_type", "key"];

/// Session files are named `session_<id>.csv`.
pub const SESSION_FILE_PREFIX: &str = "session_";
pub const SESSION_FILE_EXTENSION: &str = "csv";

/// `strftime` pattern for session IDs: local time, one underscore.
pub const SESSION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// ISO-8601 local timestamp with microseconds, as written to the timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Kind of input that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Keystroke,
    Click,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Keystroke => "keystroke",
            EventType::Click => "click",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keystroke" => Ok(EventType::Keystroke),
            "click" => Ok(EventType::Click),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

/// One recorded keystroke or click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub app: String,
    pub event_type: EventType,
    /// Literal key or button name; the event type name when none is known.
    pub key: String,
}

impl Event {
    pub fn new(
        timestamp: DateTime<Local>,
        app: impl Into<String>,
        event_type: EventType,
        key: Option<&str>,
    ) -> Self {
        let key = match key {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => event_type.as_str().to_string(),
        };

        Self {
            timestamp,
            app: app.into(),
            event_type,
            key,
        }
    }

    /// The row this event occupies in a session file.
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            timestamp: self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            app: self.app.clone(),
            event_type: self.event_type.as_str().to_string(),
            key: self.key.clone(),
        }
    }
}

/// A row read back from a session file.
///
/// Fields stay as text because files written by other versions may carry
/// values this version does not know how to type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub app: String,
    pub event_type: String,
    pub key: String,
}

impl EventRecord {
    pub fn parsed_event_type(&self) -> Option<EventType> {
        self.event_type.parse().ok()
    }
}

/// One bounded period of tracking with its own buffer and file.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    path: PathBuf,
    started_at: DateTime<Local>,
    events: Vec<Event>,
}

impl Session {
    pub fn new(id: String, path: PathBuf, started_at: DateTime<Local>) -> Self {
        Self {
            id,
            path,
            started_at,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Session ID for a session starting at `time`.
pub fn session_id_for(time: DateTime<Local>) -> String {
    time.format(SESSION_ID_FORMAT).to_string()
}

/// File name for the session with the given ID.
pub fn session_file_name(session_id: &str) -> String {
    format!("{SESSION_FILE_PREFIX}{session_id}.{SESSION_FILE_EXTENSION}")
}

/// Whether a file name follows the session naming convention.
pub fn is_session_file_name(name: &str) -> bool {
    name.starts_with(SESSION_FILE_PREFIX)
        && name
            .strip_suffix(SESSION_FILE_EXTENSION)
            .is_some_and(|stem| stem.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, h, m, s).unwrap()
    }

    #[test]
    fn test_session_id_format() {
        assert_eq!(session_id_for(at(9, 5, 3)), "20240307_090503");
        assert_eq!(session_file_name("20240307_090503"), "session_20240307_090503.csv");
    }

    #[test]
    fn test_session_file_name_matching() {
        assert!(is_session_file_name("session_20240307_090503.csv"));
        assert!(!is_session_file_name("session_20240307_090503.csv.tmp"));
        assert!(!is_session_file_name("session_20240307_090503.json"));
        assert!(!is_session_file_name("notes.csv"));
    }

    #[test]
    fn test_missing_key_repeats_event_type() {
        let event = Event::new(at(10, 0, 0), "Finder", EventType::Click, None);
        assert_eq!(event.key, "click");

        let event = Event::new(at(10, 0, 0), "Finder", EventType::Keystroke, Some(""));
        assert_eq!(event.key, "keystroke");
    }

    #[test]
    fn test_record_fields() {
        let event = Event::new(at(10, 0, 0), "Finder", EventType::Keystroke, Some("a"));
        let record = event.to_record();
        assert_eq!(record.timestamp, "2024-03-07T10:00:00.000000");
        assert_eq!(record.event_type, "keystroke");
        assert_eq!(record.parsed_event_type(), Some(EventType::Keystroke));
    }
}
