use super::files::{atomic_write, ensure_harmonia_dir, read_file};
use super::merge::merge_snapshot;
use crate::app::AppState;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed key the whole state snapshot lives under
pub const STATE_KEY: &str = "harmonia_state_v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage for '{key}' is unavailable: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("stored value for '{key}' is corrupt and was discarded: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Minimal string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    /// Removing a missing key is not an error
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

/// Key-value storage backed by one JSON file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store rooted at the discovered harmonia directory
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(ensure_harmonia_dir()?))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        read_file(self.path_for(key))
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        atomic_write(self.path_for(key), value)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// What happened when reading the persisted snapshot
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing stored yet; defaults stand
    NoPriorState,
    /// Snapshot merged over the defaults
    Restored { skipped: usize },
    /// Snapshot was unreadable JSON; it has been cleared and defaults stand
    Discarded(StoreError),
    /// Storage could not be read at all; defaults stand, nothing was cleared
    Unavailable(StoreError),
}

impl LoadOutcome {
    /// Non-fatal problem worth telling the user about
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            LoadOutcome::Discarded(e) | LoadOutcome::Unavailable(e) => Some(e),
            _ => None,
        }
    }
}

/// Saves and restores the application state under `STATE_KEY`
pub struct StateStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> StateStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    #[cfg(test)]
    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Serialize the whole state. On failure the previous snapshot is untouched.
    pub fn save(&mut self, state: &AppState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        self.kv.set(STATE_KEY, &json).map_err(|source| StoreError::Io {
            key: STATE_KEY.to_string(),
            source,
        })?;
        debug!(bytes = json.len(), "state saved");
        Ok(())
    }

    /// Overlay the persisted snapshot (if any) onto `state`
    pub fn load_into(&mut self, state: &mut AppState) -> LoadOutcome {
        let raw = match self.kv.get(STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadOutcome::NoPriorState,
            Err(source) => {
                warn!(error = %source, "could not read saved state, using defaults");
                return LoadOutcome::Unavailable(StoreError::Io {
                    key: STATE_KEY.to_string(),
                    source,
                });
            }
        };

        let reason = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(snapshot) if snapshot.is_object() => {
                let skipped = merge_snapshot(state, &snapshot);
                debug!(skipped, "state restored");
                return LoadOutcome::Restored { skipped };
            }
            Ok(_) => "snapshot is not a JSON object".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(reason = %reason, "saved state is corrupt, discarding it");
        if let Err(e) = self.kv.remove(STATE_KEY) {
            warn!(error = %e, "failed to clear corrupt state");
        }
        LoadOutcome::Discarded(StoreError::Corrupt {
            key: STATE_KEY.to_string(),
            reason,
        })
    }
}
