//! Session recording core.
//!
//! - `model`: events, sessions and the session file naming convention
//! - `clock`: time source, swappable for tests
//! - `store`: CSV persistence and read-back
//! - `recorder`: the start/stop/autosave state machine

pub mod clock;
pub mod model;
pub mod recorder;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use model::{Event, EventRecord, EventType, Session, CSV_HEADER};
pub use recorder::{Recorder, TrackingMode};
pub use store::{SaveOutcome, SessionStore, StoreError};
