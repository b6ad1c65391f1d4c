//! Snapshot persistence
//!
//! The timer state and ledger are saved whole under a fixed key and read back
//! whole. `FileStore` keeps them in `<data_dir>/timer-storage.json`.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::snapshot::{TimerSnapshot, STORAGE_KEY};

/// Load/save collaborator for the timer snapshot
pub trait SnapshotStore {
    /// Load the persisted snapshot, if one exists
    fn load(&self) -> Result<Option<TimerSnapshot>>;

    /// Replace the persisted snapshot
    fn save(&self, snapshot: &TimerSnapshot) -> Result<()>;
}

/// Snapshot stored as a JSON file
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Create a store in `data_dir`, creating the directory if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", STORAGE_KEY))
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<TimerSnapshot>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read timer state: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot = TimerSnapshot::from_json(&content)
            .with_context(|| format!("Failed to decode timer state: {}", path.display()))?;

        debug!(path = %path.display(), sessions = snapshot.sessions.len(), "loaded timer state");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()> {
        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        let content = snapshot.to_json().context("Failed to serialize timer state")?;

        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write timer state: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace timer state: {}", path.display()))?;

        debug!(path = %path.display(), "saved timer state");
        Ok(())
    }
}

/// In-memory store holding the encoded snapshot
#[derive(Debug, Default)]
pub struct MemoryStore {
    content: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON currently held
    pub fn raw(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    /// Seed the store with raw JSON
    pub fn set_raw(&self, json: impl Into<String>) {
        *self.content.borrow_mut() = Some(json.into());
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<TimerSnapshot>> {
        match self.content.borrow().as_deref() {
            Some(json) => Ok(Some(TimerSnapshot::from_json(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()> {
        *self.content.borrow_mut() = Some(snapshot.to_json()?);
        Ok(())
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn load(&self) -> Result<Option<TimerSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}
