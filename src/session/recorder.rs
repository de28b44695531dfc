//! The session recorder.
//!
//! A [`Recorder`] is either idle or tracking one open session. While
//! tracking, every call to [`Recorder::record_event`] appends an event to
//! the session buffer and, once the autosave interval has elapsed since the
//! last save, rewrites the session file. There is no timer thread: autosave
//! only ever happens on the back of an incoming event or on [`Recorder::stop`].
//!
//! Calling [`Recorder::start`] while a session is open finalizes that
//! session (saves it) before opening the new one.

use crate::collector::InputEvent;
use crate::identity::{AppIdentity, GLOBAL_APP};
use crate::session::clock::{Clock, SystemClock};
use crate::session::model::{session_id_for, Event, EventType, Session};
use crate::session::store::{SaveOutcome, SessionStore};
use crate::stats::RecorderStats;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How the `app` column is filled for new events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Ask the identity provider for the focused application.
    #[default]
    #[serde(rename = "app")]
    AppSpecific,
    /// Record [`GLOBAL_APP`] for every event.
    #[serde(rename = "global")]
    Global,
}

impl TrackingMode {
    pub fn toggled(self) -> Self {
        match self {
            TrackingMode::AppSpecific => TrackingMode::Global,
            TrackingMode::Global => TrackingMode::AppSpecific,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::AppSpecific => "app",
            TrackingMode::Global => "global",
        }
    }
}

impl std::fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "app" | "app-specific" => Ok(TrackingMode::AppSpecific),
            "global" => Ok(TrackingMode::Global),
            other => Err(format!("unknown tracking mode: {other} (expected app or global)")),
        }
    }
}

/// State that changes together under the recorder lock.
struct SessionState {
    session: Option<Session>,
    last_save: DateTime<Local>,
}

/// Records input into the current session and persists it.
///
/// `tracking` and `event_count` are only written while the state lock is
/// held, but can be read without it for display.
pub struct Recorder {
    store: SessionStore,
    clock: Arc<dyn Clock>,
    autosave_interval: Duration,
    tracking: AtomicBool,
    global_mode: AtomicBool,
    event_count: AtomicU64,
    state: Mutex<SessionState>,
}

impl Recorder {
    /// Create an idle recorder using the system clock.
    pub fn new(store: SessionStore, autosave_interval: Duration) -> Self {
        Self::with_clock(store, autosave_interval, Arc::new(SystemClock))
    }

    /// Create an idle recorder with an explicit time source.
    pub fn with_clock(
        store: SessionStore,
        autosave_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        Self {
            store,
            clock,
            autosave_interval,
            tracking: AtomicBool::new(false),
            global_mode: AtomicBool::new(false),
            event_count: AtomicU64::new(0),
            state: Mutex::new(SessionState {
                session: None,
                last_save: now,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new session and begin tracking. Returns the session ID.
    ///
    /// Input delivery is not arranged here; the caller subscribes the
    /// collector before starting.
    pub fn start(&self) -> String {
        let mut state = self.lock_state();

        if self.tracking.load(Ordering::SeqCst) {
            self.tracking.store(false, Ordering::SeqCst);
            if let Some(previous) = state.session.as_ref() {
                tracing::info!("Finalizing session {} before starting a new one", previous.id());
            }
            self.save_locked(&state);
        }

        let now = self.clock.now();
        let id = session_id_for(now);
        let path = self.store.session_path(&id);

        state.session = Some(Session::new(id.clone(), path, now));
        state.last_save = now;
        self.event_count.store(0, Ordering::SeqCst);
        self.tracking.store(true, Ordering::SeqCst);

        tracing::info!("Tracking started, session {id}");
        id
    }

    /// Stop tracking and save the session immediately.
    ///
    /// The buffer stays in memory until the next [`Recorder::start`].
    /// Returns the number of events in the session.
    pub fn stop(&self) -> usize {
        let state = self.lock_state();
        self.tracking.store(false, Ordering::SeqCst);
        self.save_locked(&state);

        let count = state.session.as_ref().map_or(0, Session::len);
        tracing::info!("Tracking stopped, {count} events in session");
        count
    }

    /// Record one event in the open session.
    ///
    /// Does nothing when not tracking; such events are dropped, not queued.
    /// The provider is not consulted in global mode.
    pub fn record_event(
        &self,
        event_type: EventType,
        key: Option<&str>,
        provider: &dyn AppIdentity,
    ) {
        if !self.tracking.load(Ordering::SeqCst) {
            return;
        }

        let app = match self.mode() {
            TrackingMode::Global => GLOBAL_APP.to_string(),
            TrackingMode::AppSpecific => provider.active_app_name(),
        };

        let mut state = self.lock_state();
        // Re-check: stop() may have run while the app name was resolved
        if !self.tracking.load(Ordering::SeqCst) {
            return;
        }
        let Some(session) = state.session.as_mut() else {
            return;
        };

        let now = self.clock.now();
        let event = Event::new(now, app, event_type, key);
        tracing::debug!("[{}] {}: {}", event.app, event.event_type, event.key);
        session.push(event);
        self.event_count.fetch_add(1, Ordering::SeqCst);

        if self.autosave_due(&state, now) {
            let saved = self.save_locked(&state);
            state.last_save = now;
            if saved {
                let buffered = state.session.as_ref().map_or(0, Session::len);
                tracing::info!("Auto-saved {buffered} events");
            }
        }
    }

    fn autosave_due(&self, state: &SessionState, now: DateTime<Local>) -> bool {
        // A clock that went backwards never triggers a save
        (now - state.last_save)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.autosave_interval)
    }

    /// Key notification from the input source. Every key is a press.
    pub fn on_key(&self, key: &str, provider: &dyn AppIdentity) {
        self.record_event(EventType::Keystroke, Some(key), provider);
    }

    /// Click notification from the input source. Releases are ignored.
    pub fn on_click(&self, button: &str, pressed: bool, provider: &dyn AppIdentity) {
        if pressed {
            self.record_event(EventType::Click, Some(button), provider);
        }
    }

    /// Dispatch a raw input notification. Button releases are dropped.
    pub fn handle(&self, event: &InputEvent, provider: &dyn AppIdentity) {
        if !event.is_press() {
            return;
        }
        match event {
            InputEvent::Key { key } => self.on_key(key, provider),
            InputEvent::Click { button, .. } => {
                self.record_event(EventType::Click, Some(button), provider)
            }
        }
    }

    /// Save the current buffer now. Returns false if the write failed.
    pub fn save_now(&self) -> bool {
        let state = self.lock_state();
        self.save_locked(&state)
    }

    /// Write failures are logged and swallowed; the buffer is kept so the
    /// next save retries with everything recorded so far.
    fn save_locked(&self, state: &SessionState) -> bool {
        let Some(session) = state.session.as_ref() else {
            return true;
        };

        match self.store.save(session) {
            Ok(SaveOutcome::Written(rows)) => {
                tracing::debug!("Saved {rows} events to {}", session.path().display());
                true
            }
            Ok(SaveOutcome::Skipped) => true,
            Err(e) => {
                tracing::warn!("Error saving session {}: {e}", session.id());
                false
            }
        }
    }

    /// Flip between app-specific and global mode; returns the new mode.
    pub fn toggle_mode(&self) -> TrackingMode {
        let was_global = self.global_mode.fetch_xor(true, Ordering::SeqCst);
        let mode = if was_global {
            TrackingMode::AppSpecific
        } else {
            TrackingMode::Global
        };
        tracing::info!("Switched to {mode} mode");
        mode
    }

    pub fn set_mode(&self, mode: TrackingMode) {
        self.global_mode
            .store(mode == TrackingMode::Global, Ordering::SeqCst);
    }

    pub fn mode(&self) -> TrackingMode {
        if self.global_mode.load(Ordering::SeqCst) {
            TrackingMode::Global
        } else {
            TrackingMode::AppSpecific
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    /// Events recorded in the current session.
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    pub fn session_id(&self) -> Option<String> {
        self.lock_state()
            .session
            .as_ref()
            .map(|s| s.id().to_string())
    }

    pub fn session_path(&self) -> Option<PathBuf> {
        self.lock_state()
            .session
            .as_ref()
            .map(|s| s.path().to_path_buf())
    }

    pub fn session_start(&self) -> Option<DateTime<Local>> {
        self.lock_state().session.as_ref().map(Session::started_at)
    }

    /// Copy of the current session buffer.
    pub fn events(&self) -> Vec<Event> {
        self.lock_state()
            .session
            .as_ref()
            .map(|s| s.events().to_vec())
            .unwrap_or_default()
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Counters for display.
    pub fn stats(&self) -> RecorderStats {
        let now = self.clock.now();
        let started = self.session_start();
        RecorderStats {
            tracking: self.is_tracking(),
            mode: self.mode(),
            session_id: self.session_id(),
            event_count: self.event_count(),
            session_duration_secs: started
                .map(|s| (now - s).num_seconds().max(0) as u64)
                .unwrap_or(0),
        }
    }
}
