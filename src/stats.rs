//! Display counters for the recorder and the session archive.
//!
//! These are advisory snapshots: callers poll them at whatever cadence
//! suits their display and tolerate slightly stale values.

use crate::session::TrackingMode;
use serde::{Deserialize, Serialize};

/// Snapshot of the recorder's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderStats {
    pub tracking: bool,
    pub mode: TrackingMode,
    pub session_id: Option<String>,
    /// Events recorded in the current session
    pub event_count: u64,
    /// Seconds since the current session started
    pub session_duration_secs: u64,
}

impl RecorderStats {
    /// One-line status, e.g. `12m 3s | 40 events`.
    pub fn summary(&self) -> String {
        if self.tracking {
            let minutes = self.session_duration_secs / 60;
            let seconds = self.session_duration_secs % 60;
            format!(
                "{minutes}m {seconds}s | {} events",
                format_count(self.event_count)
            )
        } else {
            format!("Stopped | {} events", format_count(self.event_count))
        }
    }
}

/// Totals over every stored session file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub sessions: usize,
    pub events: usize,
}

impl ArchiveStats {
    pub fn summary(&self) -> String {
        format!(
            "Total: {} events in {} sessions",
            format_count(self.events as u64),
            format_count(self.sessions as u64)
        )
    }
}

/// Format a count with thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
