//! Fallback collector for targets without an input hook implementation.
//!
//! This exists so the crate (and binary) can compile on Linux and other
//! targets. The recorder still works; it simply never receives input.

use crate::collector::types::InputEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for which event sources to capture.
///
/// On these platforms this is accepted but no system events are captured.
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

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// A collector that never emits events on its own.
///
/// [`NoopCollector::sender`] lets callers (and tests) inject notifications
/// through the same channel a real hook would use.
pub struct NoopCollector {
    _config: CollectorConfig,
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    /// Create a new noop collector.
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(10_000);
        Self {
            _config: config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start capturing events.
    ///
    /// This only marks the collector as running.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        tracing::warn!("No input hook available on this platform; nothing will be captured");
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop capturing events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
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

/// There is no Input Monitoring permission gate on these platforms.
pub fn check_permission() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_twice_fails() {
        let mut collector = NoopCollector::new(CollectorConfig::default());
        assert!(collector.start().is_ok());
        assert!(matches!(
            collector.start(),
            Err(CollectorError::AlreadyRunning)
        ));
        collector.stop();
        assert!(!collector.is_running());
    }

    #[test]
    fn test_injected_events_arrive() {
        let collector = NoopCollector::new(CollectorConfig::default());
        collector.sender().send(InputEvent::key("x")).unwrap();
        assert_eq!(collector.try_recv(), Some(InputEvent::key("x")));
        assert_eq!(collector.try_recv(), None);
    }
}
