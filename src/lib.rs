//! Activity Tracker - keystroke and click recorder.
//!
//! Records every key press and mouse click together with the name of the
//! application in the foreground, and writes them to one CSV file per
//! tracking session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Activity Tracker                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Collector  │──▶│  Recorder   │──▶│   Session   │         │
//! │  │ (OS hooks)  │   │ (autosave)  │   │ Store (CSV) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                           ▲                                  │
//! │                    ┌─────────────┐                           │
//! │                    │  Identity   │                           │
//! │                    │ (front app) │                           │
//! │                    └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use activity_tracker::{collector, identity, Recorder, SessionStore};
//!
//! let store = SessionStore::new("activity_data");
//! let recorder = Arc::new(Recorder::new(store, Duration::from_secs(30)));
//!
//! // Subscribe to input first, then open a session
//! let mut collector = collector::Collector::new(collector::CollectorConfig::default());
//! collector.start().expect("Failed to start collector");
//! collector::pump::spawn(
//!     collector.receiver().clone(),
//!     recorder.clone(),
//!     Arc::new(identity::SystemAppIdentity::new()),
//! );
//!
//! recorder.start();
//! // ... later
//! recorder.stop();
//! ```

pub mod collector;
pub mod config;
pub mod identity;
pub mod session;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorConfig, CollectorError, InputEvent};
pub use config::{Config, SourceConfig};
pub use identity::{AppIdentity, SystemAppIdentity, GLOBAL_APP, UNKNOWN_APP};
pub use session::{
    Event, EventRecord, EventType, Recorder, SessionStore, StoreError, TrackingMode,
};
pub use stats::{ArchiveStats, RecorderStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the tracker stores, shown before recording starts.
pub const DATA_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 ACTIVITY TRACKER - DATA NOTICE                   ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  ✓ WHAT IS RECORDED:                                             ║
║    • Every key you press, including the character typed          ║
║    • Every mouse button press (left, right, middle)              ║
║    • The name of the application in the foreground               ║
║    • The time of each event                                      ║
║                                                                  ║
║  ✗ WHAT IS NOT RECORDED:                                         ║
║    • Cursor position or movement                                 ║
║    • Screen content                                              ║
║                                                                  ║
║  Session files are plain, unencrypted CSV on this machine only.  ║
║  Typed passwords end up in them. Delete them when done:          ║
║    activity-tracker open                                         ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_notice_contents() {
        assert!(DATA_NOTICE.contains("DATA NOTICE"));
        assert!(DATA_NOTICE.contains("Every key you press"));
        assert!(DATA_NOTICE.contains("unencrypted"));
    }
}
