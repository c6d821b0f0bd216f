//! Saved intake progress.
//!
//! A snapshot is written after every answered question so an interrupted
//! session can resume. Snapshots past the retention window are ignored.

use super::answers::AnswerStore;
use crate::error::Result;
use crate::{io, paths};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub position: usize,
    pub answers: AnswerStore,
    pub saved_at: DateTime<Utc>,
}

impl ProgressSnapshot {
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now - self.saved_at > retention
    }
}

/// Where snapshots live between sessions.
pub trait ProgressStore: Send {
    fn load(&self) -> Result<Option<ProgressSnapshot>>;
    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileProgressStore
// ---------------------------------------------------------------------------

/// One JSON file per client key under `.clientdesk/intake/`.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: &Path, key: &str) -> Result<Self> {
        paths::validate_key(key)?;
        Ok(Self {
            path: paths::progress_path(root, key),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Result<Option<ProgressSnapshot>> {
        match io::read_if_present(&self.path)? {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        io::atomic_write(&self.path, &data)
    }

    fn clear(&mut self) -> Result<()> {
        io::remove_if_exists(&self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryProgressStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    snapshot: Option<ProgressSnapshot>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        self.snapshot.as_ref()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Option<ProgressSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.snapshot = None;
        Ok(())
    }
}
