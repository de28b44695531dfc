//! On-disk session files.
//!
//! Each session is one CSV file in the data directory. A save always
//! rewrites the whole file from the in-memory buffer, so the file on disk
//! is a complete snapshot as of the last save.

use crate::session::model::{
    is_session_file_name, session_file_name, EventRecord, Session, CSV_HEADER,
};
use crate::stats::ArchiveStats;
use std::path::{Path, PathBuf};

/// What a call to [`SessionStore::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The session had no events; nothing was written.
    Skipped,
    /// The file now holds this many event rows.
    Written(usize),
}

/// Reads and writes session files in one data directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file for the session with the given ID.
    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.data_dir.join(session_file_name(session_id))
    }

    /// Write the session's full buffer to its file, replacing any content.
    ///
    /// The rows are written to a sibling temp file first and renamed over
    /// the target.
    pub fn save(&self, session: &Session) -> Result<SaveOutcome, StoreError> {
        if session.is_empty() {
            return Ok(SaveOutcome::Skipped);
        }

        let path = session.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let temp_path = path.with_extension("csv.tmp");
        let written = write_rows(&temp_path, session)
            .and_then(|()| std::fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e)));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        Ok(SaveOutcome::Written(session.len()))
    }

    /// Session files in the data directory, oldest first.
    ///
    /// A missing data directory simply has no sessions.
    pub fn session_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.data_dir, e)),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_session_file_name)
            })
            .collect();

        // IDs are timestamps, so name order is start order
        files.sort();
        Ok(files)
    }

    /// Every row of every session file, file by file in start order.
    ///
    /// A file that cannot be read or contains a malformed row is skipped
    /// as a whole and logged.
    pub fn load_all(&self) -> Vec<EventRecord> {
        let files = match self.session_files() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Could not list session files: {e}");
                return Vec::new();
            }
        };

        let mut all = Vec::new();
        for file in &files {
            match read_session_file(file) {
                Ok(records) => all.extend(records),
                Err(e) => tracing::warn!("Skipping session file: {e}"),
            }
        }
        all
    }

    /// Number of session files. Display only.
    pub fn count_sessions(&self) -> usize {
        match self.session_files() {
            Ok(files) => files.len(),
            Err(e) => {
                tracing::warn!("Could not count sessions: {e}");
                0
            }
        }
    }

    /// Totals across all stored sessions.
    pub fn archive_stats(&self) -> ArchiveStats {
        ArchiveStats {
            sessions: self.count_sessions(),
            events: self.load_all().len(),
        }
    }
}

fn write_rows(temp_path: &Path, session: &Session) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_path(temp_path)
        .map_err(|e| StoreError::csv(temp_path, e))?;

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| StoreError::csv(temp_path, e))?;
    for event in session.events() {
        let record = event.to_record();
        writer
            .write_record([
                record.timestamp.as_str(),
                record.app.as_str(),
                record.event_type.as_str(),
                record.key.as_str(),
            ])
            .map_err(|e| StoreError::csv(temp_path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(temp_path, e))
}

/// Parse one session file completely.
pub fn read_session_file(path: &Path) -> Result<Vec<EventRecord>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    reader
        .deserialize::<EventRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Errors raised while reading or writing session files.
#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            StoreError::Csv { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Csv { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::{session_id_for, Event, EventType};
    use chrono::{Duration, Local, TimeZone};
    use tempfile::tempdir;

    fn session_with(store: &SessionStore, events: &[(EventType, &str, &str)]) -> Session {
        let start = Local.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let id = session_id_for(start);
        let mut session = Session::new(id.clone(), store.session_path(&id), start);
        for (i, (event_type, app, key)) in events.iter().enumerate() {
            session.push(Event::new(
                start + Duration::milliseconds(i as i64 * 250),
                *app,
                *event_type,
                Some(*key),
            ));
        }
        session
    }

    #[test]
    fn test_empty_session_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = session_with(&store, &[]);

        assert_eq!(store.save(&session).unwrap(), SaveOutcome::Skipped);
        assert!(!session.path().exists());
        assert_eq!(store.count_sessions(), 0);
    }

    #[test]
    fn test_save_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = session_with(
            &store,
            &[
                (EventType::Keystroke, "Terminal", "a"),
                (EventType::Click, "Safari, Inc.", "left"),
            ],
        );

        assert_eq!(store.save(&session).unwrap(), SaveOutcome::Written(2));

        let content = std::fs::read_to_string(session.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,app,event_type,key");
        assert_eq!(lines[1], "2024-05-01T08:30:00.000000,Terminal,keystroke,a");
        // Commas in a field are quoted
        assert_eq!(
            lines[2],
            "2024-05-01T08:30:00.250000,\"Safari, Inc.\",click,left"
        );
        assert!(content.ends_with("\r\n"));
    }

    #[test]
    fn test_resave_is_byte_identical() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = session_with(&store, &[(EventType::Keystroke, "Mail", "\"")]);

        store.save(&session).unwrap();
        let first = std::fs::read(session.path()).unwrap();
        store.save(&session).unwrap();
        let second = std::fs::read(session.path()).unwrap();

        assert_eq!(first, second);
        assert!(!session.path().with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_save_creates_missing_data_dir() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("data"));
        let session = session_with(&store, &[(EventType::Click, "Finder", "right")]);

        store.save(&session).unwrap();
        assert_eq!(store.count_sessions(), 1);
    }

    #[test]
    fn test_failed_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = session_with(&store, &[(EventType::Keystroke, "Notes", "x")]);

        // A non-empty directory where the session file belongs
        std::fs::create_dir(session.path()).unwrap();
        std::fs::write(session.path().join("keep"), "").unwrap();

        assert!(store.save(&session).is_err());
        assert!(!session.path().with_extension("csv.tmp").exists());
        assert!(session.path().is_dir());
    }

    #[test]
    fn test_load_all_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("absent"));
        assert!(store.load_all().is_empty());
        assert_eq!(store.count_sessions(), 0);
    }

    #[test]
    fn test_load_all_ignores_other_files() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = session_with(&store, &[(EventType::Keystroke, "Notes", "x")]);
        store.save(&session).unwrap();

        std::fs::write(dir.path().join("session_old.json"), "[]").unwrap();
        std::fs::write(dir.path().join("readme.csv"), "a,b\n1,2\n").unwrap();

        let records = store.load_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "x");
        assert_eq!(store.count_sessions(), 1);
    }

    #[test]
    fn test_load_accepts_extra_columns() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("session_20230101_000000.csv"),
            "timestamp,app,event_type,key,extra\n2023-01-01T00:00:00,Old,click,left,1\n",
        )
        .unwrap();

        let store = SessionStore::new(dir.path());
        let records = store.load_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].app, "Old");
    }

    #[test]
    fn test_file_missing_a_column_is_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("session_20230101_000000.csv"),
            "timestamp,app,event_type\n2023-01-01T00:00:00,Old,click\n",
        )
        .unwrap();

        let store = SessionStore::new(dir.path());
        assert!(store.load_all().is_empty());
        assert_eq!(store.count_sessions(), 1);
    }

    #[test]
    fn test_archive_stats() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = session_with(
            &store,
            &[
                (EventType::Keystroke, "Notes", "x"),
                (EventType::Keystroke, "Notes", "y"),
            ],
        );
        store.save(&session).unwrap();

        let stats = store.archive_stats();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.events, 2);
    }
}
