//! Snapshot persistence for player accounts.
//!
//! [`SnapshotStore`] abstracts where snapshots live; [`FileStore`] keeps one
//! JSON file on disk with atomic temp-file-then-rename writes, and
//! [`MemoryStore`] backs tests. A missing snapshot is `Ok(None)`; a snapshot
//! that exists but cannot be decoded is an error, so callers can distinguish
//! "new player" from "corrupt data". [`load_or_default`] collapses both into
//! a playable account, logging the corrupt case.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, info};
use wattage_core::account::{PlayerAccount, PlayerProfile};
use wattage_core::economy::EconomyConfig;
use wattage_core::save::{SaveData, SaveError};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors from loading or saving a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The snapshot exists but cannot be decoded (corrupt, truncated, or an
    /// unsupported version).
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] SaveError),
}

// ===========================================================================
// SnapshotStore
// ===========================================================================

/// Where snapshots are kept. One snapshot per store.
pub trait SnapshotStore {
    /// Load the snapshot, `Ok(None)` when none has been written yet.
    fn load(&self) -> Result<Option<SaveData>, StoreError>;

    /// Persist the snapshot, replacing any previous one.
    fn save(&self, data: &SaveData) -> Result<(), StoreError>;
}

// ===========================================================================
// FileStore
// ===========================================================================

/// A single JSON snapshot file on disk.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(SaveData::decode(&text)?))
    }

    fn save(&self, data: &SaveData) -> Result<(), StoreError> {
        let text = data.encode()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.tmp_path();
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ===========================================================================
// MemoryStore
// ===========================================================================

/// An in-memory store holding the encoded snapshot text. Exercises the same
/// encode/decode path as [`FileStore`] without touching disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored text directly, bypassing encoding. For tests that
    /// need to stage corrupt or hand-written snapshots.
    pub fn inject(&self, text: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(text.into());
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        let slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_deref() {
            None => Ok(None),
            Some(text) => Ok(Some(SaveData::decode(text)?)),
        }
    }

    fn save(&self, data: &SaveData) -> Result<(), StoreError> {
        let text = data.encode()?;
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(text);
        Ok(())
    }
}

// ===========================================================================
// Startup helper
// ===========================================================================

/// Load the persisted account, or build a fresh one.
///
/// A missing snapshot is the normal new-player path. A snapshot that fails
/// to load is logged at error level and replaced by a fresh account; the
/// broken file stays on disk untouched until the next save overwrites it.
pub fn load_or_default(
    store: &dyn SnapshotStore,
    profile: PlayerProfile,
    config: EconomyConfig,
    now: chrono::DateTime<chrono::Utc>,
) -> PlayerAccount {
    match store.load() {
        Ok(Some(save)) => save.into_account(config),
        Ok(None) => {
            info!("no snapshot found, starting fresh");
            PlayerAccount::new(profile, config, now)
        }
        Err(err) => {
            error!(%err, "snapshot load failed, starting fresh");
            PlayerAccount::new(profile, config, now)
        }
    }
}
