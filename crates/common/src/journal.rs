//! Per-session append-only journals.
//!
//! Each session owns `<log_dir>/<session_id>.jsonl`. Files are created lazily
//! on first append and are never rewritten or truncated. There is no locking:
//! different sessions use different files, and appends to the same file rely
//! on append-mode writes of whole lines.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::errors::{BenchlogError, BenchlogResult};
use crate::event::{EventKind, EventRecord};
use crate::fs::{append_line, ensure_dir};
use crate::session::{SessionId, LOG_EXTENSION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionJournal {
    dir: PathBuf,
}

impl SessionJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Guarantees the log directory exists. Safe to call before every write.
    pub fn ensure_storage_ready(&self) -> BenchlogResult<()> {
        ensure_dir(&self.dir)
    }

    pub fn path_for(&self, session: &SessionId) -> BenchlogResult<PathBuf> {
        Ok(self.dir.join(session.file_name()?))
    }

    pub fn exists(&self, session: &SessionId) -> bool {
        self.path_for(session)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Stamps `kind` with the current time and appends it as one line.
    pub fn append(&self, session: &SessionId, kind: EventKind) -> BenchlogResult<EventRecord> {
        let path = self.path_for(session)?;
        self.ensure_storage_ready()?;

        let record = EventRecord::now(kind);
        append_line(&path, &record.to_line()?)?;

        debug!(session = %session, event = record.kind.name(), ts = record.ts, "event appended");
        Ok(record)
    }

    /// Appends only to a log that already exists; never creates one.
    pub fn append_existing(
        &self,
        session: &SessionId,
        kind: EventKind,
    ) -> BenchlogResult<Option<EventRecord>> {
        if !self.exists(session) {
            debug!(session = %session, event = kind.name(), "no log for session, skipping");
            return Ok(None);
        }
        self.append(session, kind).map(Some)
    }

    /// Reads every well-formed record back, in file order.
    ///
    /// Blank lines, lines that are not UTF-8 and lines that are not event
    /// records are skipped.
    pub fn read(&self, session: &SessionId) -> BenchlogResult<Vec<EventRecord>> {
        let path = self.path_for(session)?;
        let read_err = |source| BenchlogError::ReadFailed {
            path: path.clone(),
            source,
        };
        let file = fs::File::open(&path).map_err(read_err)?;

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(read_err)?;
            let text = match std::str::from_utf8(&line) {
                Ok(text) => text,
                Err(err) => {
                    trace!(line = index + 1, error = %err, "skipping non utf-8 line");
                    continue;
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EventRecord>(text) {
                Ok(record) => records.push(record),
                Err(err) => trace!(line = index + 1, error = %err, "skipping unreadable line"),
            }
        }
        Ok(records)
    }

    /// Sessions that currently have a log, sorted by id.
    pub fn sessions(&self) -> BenchlogResult<Vec<SessionId>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(BenchlogError::ReadFailed {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut sessions: Vec<SessionId> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION))
            .filter_map(|path| path.file_stem()?.to_str().map(SessionId::from))
            .collect();
        sessions.sort();
        Ok(sessions)
    }
}
