//! Forwards collector notifications into a recorder.

use crate::collector::types::InputEvent;
use crate::identity::AppIdentity;
use crate::session::Recorder;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Spawn a thread that hands every notification on `receiver` to the
/// recorder until the channel disconnects.
///
/// The recorder decides what to keep: it drops everything while idle and
/// ignores button releases.
pub fn spawn(
    receiver: Receiver<InputEvent>,
    recorder: Arc<Recorder>,
    identity: Arc<dyn AppIdentity>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            recorder.handle(&event, identity.as_ref());
        }
        tracing::debug!("Input channel closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticAppIdentity;
    use crate::session::SessionStore;
    use crossbeam_channel::unbounded;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_pump_forwards_until_disconnect() {
        let dir = tempdir().unwrap();
        let recorder = Arc::new(Recorder::new(
            SessionStore::new(dir.path()),
            Duration::from_secs(3600),
        ));
        recorder.start();

        let (tx, rx) = unbounded();
        let handle = spawn(
            rx,
            recorder.clone(),
            Arc::new(StaticAppIdentity("Terminal".to_string())),
        );

        tx.send(InputEvent::key("h")).unwrap();
        tx.send(InputEvent::click("right", true)).unwrap();
        tx.send(InputEvent::click("right", false)).unwrap();
        drop(tx);
        handle.join().unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, "h");
        assert_eq!(events[1].key, "right");
        assert!(events.iter().all(|e| e.app == "Terminal"));
    }
}
