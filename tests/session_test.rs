//! End-to-end tests of recording sessions and reading them back.

use activity_tracker::identity::StaticAppIdentity;
use activity_tracker::session::{EventType, ManualClock, Recorder, SessionStore, TrackingMode};
use activity_tracker::{GLOBAL_APP, UNKNOWN_APP};
use chrono::{Duration as ChronoDuration, Local, TimeZone};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn recorder_in(dir: &std::path::Path) -> (Recorder, ManualClock) {
    let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 6, 3, 9, 15, 0).unwrap());
    let recorder = Recorder::with_clock(
        SessionStore::new(dir),
        Duration::from_secs(60),
        Arc::new(clock.clone()),
    );
    (recorder, clock)
}

#[test]
fn test_keystroke_and_click_session() {
    let dir = tempdir().unwrap();
    let (recorder, _clock) = recorder_in(dir.path());
    let app = StaticAppIdentity("Terminal".to_string());

    recorder.start();
    recorder.record_event(EventType::Keystroke, Some("a"), &app);
    recorder.record_event(EventType::Click, Some("Left"), &app);
    recorder.stop();

    assert_eq!(recorder.event_count(), 2);
    assert!(!recorder.is_tracking());

    let store = SessionStore::new(dir.path());
    assert_eq!(store.count_sessions(), 1);

    let content = std::fs::read_to_string(dir.path().join("session_20240603_091500.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "timestamp,app,event_type,key");
    assert!(lines[1].ends_with(",Terminal,keystroke,a"));
    assert!(lines[2].ends_with(",Terminal,click,Left"));
}

#[test]
fn test_round_trip_preserves_order_and_fields() {
    let dir = tempdir().unwrap();
    let (recorder, clock) = recorder_in(dir.path());

    let keys = ["h", "e", ",", "\"", "space", "l", "ö", "enter"];
    recorder.start();
    for (i, key) in keys.iter().enumerate() {
        let app = StaticAppIdentity(format!("App {i}, with comma"));
        clock.advance(ChronoDuration::milliseconds(137));
        recorder.on_key(key, &app);
    }
    recorder.on_click("middle", true, &StaticAppIdentity("Finder".to_string()));
    recorder.stop();

    let expected: Vec<_> = recorder.events().iter().map(|e| e.to_record()).collect();
    let loaded = SessionStore::new(dir.path()).load_all();

    assert_eq!(loaded.len(), keys.len() + 1);
    assert_eq!(loaded, expected);
    assert_eq!(loaded.last().unwrap().parsed_event_type(), Some(EventType::Click));
}

#[test]
fn test_malformed_file_is_skipped() {
    let dir = tempdir().unwrap();
    let (recorder, _clock) = recorder_in(dir.path());
    let app = StaticAppIdentity("Mail".to_string());

    recorder.start();
    recorder.on_key("x", &app);
    recorder.on_key("y", &app);
    recorder.stop();

    std::fs::write(
        dir.path().join("session_20240604_100000.csv"),
        "timestamp,app,event_type,key\n\
         2024-06-04T10:00:00.000000,Mail,keystroke,z\n\
         2024-06-04T10:00:01.000000,Mail\n",
    )
    .unwrap();

    let store = SessionStore::new(dir.path());
    let loaded = store.load_all();
    assert_eq!(store.count_sessions(), 2);
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].key, "x");
    assert_eq!(loaded[1].key, "y");
}

#[test]
fn test_sessions_load_in_start_order() {
    let dir = tempdir().unwrap();
    let (recorder, clock) = recorder_in(dir.path());
    let app = StaticAppIdentity("Editor".to_string());

    recorder.start();
    recorder.on_key("1", &app);
    recorder.stop();

    clock.advance(ChronoDuration::minutes(10));
    recorder.start();
    recorder.on_key("2", &app);
    recorder.stop();

    let keys: Vec<String> = SessionStore::new(dir.path())
        .load_all()
        .into_iter()
        .map(|r| r.key)
        .collect();
    assert_eq!(keys, vec!["1", "2"]);
}

#[test]
fn test_mode_toggle_round_trip() {
    let dir = tempdir().unwrap();
    let (recorder, _clock) = recorder_in(dir.path());
    let app = StaticAppIdentity("Browser".to_string());

    recorder.start();
    assert_eq!(recorder.mode(), TrackingMode::AppSpecific);
    recorder.toggle_mode();
    recorder.on_key("g", &app);
    recorder.toggle_mode();
    recorder.on_key("a", &app);
    recorder.on_key("b", &|| String::new());

    let apps: Vec<String> = recorder.events().into_iter().map(|e| e.app).collect();
    assert_eq!(apps, vec![GLOBAL_APP, "Browser", UNKNOWN_APP]);
}

#[test]
fn test_concurrent_recording() {
    let dir = tempdir().unwrap();
    let (recorder, _clock) = recorder_in(dir.path());
    let recorder = Arc::new(recorder);
    recorder.start();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let recorder = recorder.clone();
            thread::spawn(move || {
                let app = StaticAppIdentity(format!("thread-{t}"));
                for i in 0..250 {
                    if i % 2 == 0 {
                        recorder.on_key("k", &app);
                    } else {
                        recorder.on_click("left", true, &app);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    recorder.stop();

    assert_eq!(recorder.event_count(), 1000);
    assert_eq!(recorder.events().len(), 1000);
    assert_eq!(SessionStore::new(dir.path()).load_all().len(), 1000);
}
